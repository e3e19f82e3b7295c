use contracts::domain::a001_category::aggregate::{Category, SUPPORTED_LANGUAGES};

/// Дерево категорий в CSV: одна строка на категорию, по колонке на язык
pub fn to_csv(categories: &[Category]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = [
        "category_id",
        "type",
        "path",
        "parent_path",
        "level",
        "display_order",
        "is_active",
        "icon_name",
        "image_id",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(SUPPORTED_LANGUAGES.iter().map(|lang| format!("name_{}", lang)));
    writer.write_record(&header)?;

    for category in categories {
        let mut record = vec![
            category.category_id.clone(),
            category.category_type.as_str().to_string(),
            category.path.clone(),
            category.parent_path.clone().unwrap_or_default(),
            category.level.to_string(),
            category.display_order.to_string(),
            category.is_active.to_string(),
            category.icon_name.clone().unwrap_or_default(),
            category.image_id.clone().unwrap_or_default(),
        ];
        // Без перевода - пустая ячейка, а не английское название
        record.extend(SUPPORTED_LANGUAGES.iter().map(|lang| {
            category
                .localization(lang)
                .map(|l| l.name.clone())
                .unwrap_or_default()
        }));
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV flush failed: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a001_category::aggregate::{CategoryLocalization, CategoryType};

    #[test]
    fn one_row_per_category_with_language_columns() {
        let mut shoes = Category::new(CategoryType::Consumer, "shoes", None, 1, "Shoes, boots");
        shoes.category_id = "id-1".into();
        shoes
            .localizations
            .push(CategoryLocalization::new("de", "Schuhe"));

        let csv = to_csv(&[shoes]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("category_id,type,path,parent_path"));
        assert!(lines[0].ends_with("name_ja,name_zh"));
        assert_eq!(
            lines[1],
            "id-1,consumer,shoes,,1,1,true,,,\"Shoes, boots\",,,Schuhe,,,,"
        );
    }
}
