//! Dashboard page: totals across all forms, one row per form, and a
//! create-form action.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the authenticated landing route. Aggregation lives in
//! `session::dashboard::load_dashboard`; a failed statistics call degrades
//! its row instead of failing the page.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use session::FormsApi;
use session::dashboard::{DashboardSummary, FormSummary};
use session::types::FormInput;

/// Client route for one form.
pub(crate) fn form_route(id: &str) -> String {
    format!("/forms/{}", urlencoding::encode(id))
}

pub(crate) fn plural(count: u64, word: &str) -> String {
    if count == 1 { format!("1 {word}") } else { format!("{count} {word}s") }
}

/// Secondary line under a form name.
pub(crate) fn row_caption(row: &FormSummary) -> String {
    if !row.stats_loaded {
        return "Statistics unavailable".to_owned();
    }
    format!(
        "{}, {} today",
        plural(row.stats.total_submissions, "submission"),
        row.stats.submissions_today
    )
}

pub(crate) fn validate_form_name(raw: &str) -> Result<String, &'static str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("Give the form a name.");
    }
    Ok(name.to_owned())
}

#[cfg(feature = "csr")]
fn load(
    forms: FormsApi,
    summary: RwSignal<Option<DashboardSummary>>,
    error: RwSignal<Option<String>>,
    loading: RwSignal<bool>,
) {
    loading.set(true);
    leptos::task::spawn_local(async move {
        match session::dashboard::load_dashboard(&forms).await {
            Ok(loaded) => {
                summary.set(Some(loaded));
                error.set(None);
            }
            Err(e) => error.set(Some(session::extract_error_message(&e))),
        }
        loading.set(false);
    });
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let forms = expect_context::<FormsApi>();
    let navigate = use_navigate();

    let summary = RwSignal::new(None::<DashboardSummary>);
    let error = RwSignal::new(None::<String>);
    let loading = RwSignal::new(true);
    let new_name = RwSignal::new(String::new());
    let create_error = RwSignal::new(None::<String>);
    let create_pending = RwSignal::new(false);

    #[cfg(feature = "csr")]
    load(forms.clone(), summary, error, loading);

    let on_create = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if create_pending.get() {
            return;
        }
        let name = match validate_form_name(&new_name.get()) {
            Ok(name) => name,
            Err(message) => {
                create_error.set(Some(message.to_owned()));
                return;
            }
        };
        create_pending.set(true);
        create_error.set(None);

        #[cfg(feature = "csr")]
        {
            let forms = forms.clone();
            let navigate = navigate.clone();
            leptos::task::spawn_local(async move {
                let input = FormInput { name, ..FormInput::default() };
                match forms.create(&input).await {
                    Ok(form) => {
                        new_name.set(String::new());
                        navigate(&form_route(&form.id), NavigateOptions::default());
                    }
                    Err(e) => create_error.set(Some(session::extract_error_message(&e))),
                }
                create_pending.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&forms, &navigate, name);
        }
    };

    let totals = move || summary.get().unwrap_or_default();

    view! {
        <div class="dashboard-page">
            <header class="dashboard-page__header">
                <h1>"Your forms"</h1>
                <form class="dashboard-page__create" on:submit=on_create>
                    <input
                        class="input"
                        type="text"
                        placeholder="New form name"
                        prop:value=move || new_name.get()
                        on:input=move |ev| new_name.set(event_target_value(&ev))
                    />
                    <button class="btn" type="submit" disabled=move || create_pending.get()>
                        "+ New form"
                    </button>
                </form>
            </header>
            <Show when=move || create_error.get().is_some()>
                <p class="dashboard-page__error">{move || create_error.get().unwrap_or_default()}</p>
            </Show>
            <Show when=move || error.get().is_some()>
                <p class="dashboard-page__error">{move || error.get().unwrap_or_default()}</p>
            </Show>
            <Show when=move || !loading.get() fallback=move || view! { <p>"Loading forms..."</p> }>
                <section class="dashboard-page__totals">
                    <div class="stat">
                        <span class="stat__value">{move || totals().form_count}</span>
                        <span class="stat__label">"Forms"</span>
                    </div>
                    <div class="stat">
                        <span class="stat__value">{move || totals().total_submissions}</span>
                        <span class="stat__label">"Submissions"</span>
                    </div>
                    <div class="stat">
                        <span class="stat__value">{move || totals().submissions_today}</span>
                        <span class="stat__label">"Today"</span>
                    </div>
                    <div class="stat">
                        <span class="stat__value">{move || totals().submissions_this_week}</span>
                        <span class="stat__label">"This week"</span>
                    </div>
                </section>
                <Show
                    when=move || { totals().form_count > 0 }
                    fallback=|| view! { <p class="dashboard-page__empty">"No forms yet. Create one to get an endpoint."</p> }
                >
                    <ul class="form-list">
                        {move || {
                            let busiest = totals().busiest_form;
                            totals()
                                .forms
                                .into_iter()
                                .map(|row| {
                                    let href = form_route(&row.form.id);
                                    let caption = row_caption(&row);
                                    let is_busiest = busiest.as_deref() == Some(row.form.id.as_str());
                                    view! {
                                        <li class="form-list__row" class:form-list__row--busiest=is_busiest>
                                            <a href=href class="form-list__name">{row.form.name}</a>
                                            <span class="form-list__caption">{caption}</span>
                                        </li>
                                    }
                                })
                                .collect_view()
                        }}
                    </ul>
                </Show>
            </Show>
        </div>
    }
}
