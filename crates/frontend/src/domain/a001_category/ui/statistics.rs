use super::view_model::CategoryManagerVm;
use crate::shared::modal_frame::ModalFrame;
use contracts::domain::a001_category::aggregate::language_label;
use contracts::domain::a001_category::statistics::CategoryStatistics;
use leptos::prelude::*;
use thaw::*;

/// Сводка по текущему (в том числе несохранённому) дереву
#[component]
pub fn StatisticsModal(vm: CategoryManagerVm, on_close: Callback<()>) -> impl IntoView {
    let stats = Memo::new(move |_| vm.working.with(|w| CategoryStatistics::compute(&w.categories())));
    let category_type = vm.category_type.get_untracked();

    view! {
        <ModalFrame title=format!("Statistics: {}", category_type.label()) on_close=on_close>
            {move || {
                let s = stats.get();
                let max_level_count = s.by_level.values().copied().max().unwrap_or(0).max(1);
                view! {
                    <div class="stats-grid">
                        <div class="stats-card">
                            <div class="stats-card__value">{s.total}</div>
                            <div class="stats-card__label">"Categories"</div>
                        </div>
                        <div class="stats-card">
                            <div class="stats-card__value">{s.active}</div>
                            <div class="stats-card__label">"Active"</div>
                        </div>
                        <div class="stats-card">
                            <div class="stats-card__value">{s.inactive}</div>
                            <div class="stats-card__label">"Inactive"</div>
                        </div>
                        <div class="stats-card">
                            <div class="stats-card__value">{s.roots}</div>
                            <div class="stats-card__label">"Top level"</div>
                        </div>
                        <div class="stats-card">
                            <div class="stats-card__value">{s.display_depth()}</div>
                            <div class="stats-card__label">"Depth"</div>
                        </div>
                        <div class="stats-card">
                            <div class="stats-card__value">{format!("{} / {}", s.with_icon, s.with_image)}</div>
                            <div class="stats-card__label">"With icon / image"</div>
                        </div>
                    </div>

                    <h3 class="modal-section__title">"Categories per level"</h3>
                    <div class="stats-bars">
                        {s.by_level
                            .iter()
                            .map(|(level, count)| {
                                let width = (*count as f64 / max_level_count as f64) * 100.0;
                                view! {
                                    <div class="stats-bar">
                                        <span class="stats-bar__label">{format!("Level {}", level)}</span>
                                        <div class="stats-bar__track">
                                            <div class="stats-bar__fill" style=format!("width: {:.1}%;", width)></div>
                                        </div>
                                        <span class="stats-bar__value">{*count}</span>
                                    </div>
                                }
                            })
                            .collect_view()}
                    </div>

                    <h3 class="modal-section__title">"Translation coverage"</h3>
                    <Table>
                        <TableHeader>
                            <TableRow>
                                <TableHeaderCell resizable=false>"Language"</TableHeaderCell>
                                <TableHeaderCell resizable=false>"Translated"</TableHeaderCell>
                                <TableHeaderCell resizable=false>"Missing"</TableHeaderCell>
                                <TableHeaderCell resizable=false>"Coverage"</TableHeaderCell>
                            </TableRow>
                        </TableHeader>
                        <TableBody>
                            {s.coverage
                                .into_iter()
                                .map(|c| {
                                    let percent = c.percent();
                                    view! {
                                        <TableRow>
                                            <TableCell>{language_label(&c.language_code)}</TableCell>
                                            <TableCell>{c.translated}</TableCell>
                                            <TableCell>{c.missing}</TableCell>
                                            <TableCell>
                                                <div class="stats-bar__track">
                                                    <div class="stats-bar__fill" style=format!("width: {:.1}%;", percent)></div>
                                                </div>
                                                {format!("{:.0}%", percent)}
                                            </TableCell>
                                        </TableRow>
                                    }
                                })
                                .collect_view()}
                        </TableBody>
                    </Table>
                }
            }}
        </ModalFrame>
    }
}
