/// Иконки, доступные для категорий: (ключ, подпись)
pub const CATEGORY_ICONS: &[(&str, &str)] = &[
    ("shopping-bag", "Shopping"),
    ("shirt", "Apparel"),
    ("laptop", "Electronics"),
    ("home", "Home"),
    ("heart", "Health & Beauty"),
    ("gift", "Gifts"),
    ("book", "Books"),
    ("music", "Music"),
    ("camera", "Photo & Video"),
    ("car", "Automotive"),
    ("coffee", "Food & Drink"),
    ("star", "Featured"),
    ("tag", "Deals"),
    ("globe", "Travel"),
    ("smile", "Kids"),
    ("zap", "Sports"),
];

pub fn is_known_icon(key: &str) -> bool {
    CATEGORY_ICONS.iter().any(|(k, _)| *k == key)
}

pub fn icon_label(key: &str) -> Option<&'static str> {
    CATEGORY_ICONS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}
