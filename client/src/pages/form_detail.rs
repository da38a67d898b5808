//! Form detail page: settings editor, embed snippets, statistics and a
//! paged submissions table.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route `/forms/:id`, behind the route guard. Route param changes do not
//! unmount the page, so every load is keyed on the current id and results
//! for a previous id are dropped.

#[cfg(test)]
#[path = "form_detail_test.rs"]
mod form_detail_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_params_map};
use session::types::{Form, FormInput, FormSettings, FormStatistics, Pagination, Submission, SubmissionPage};
use session::{ClientConfig, FormsApi};

use crate::util::embed::{fetch_snippet, html_snippet, submission_endpoint};

/// Text-field mirror of a form's editable settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SettingsDraft {
    pub name: String,
    pub description: String,
    pub redirect_url: String,
    pub notify_email: String,
    pub honeypot_field: String,
    /// One origin per line (commas also accepted).
    pub allowed_origins: String,
}

pub(crate) fn optional(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

pub(crate) fn is_http_url(value: &str) -> bool {
    value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty())
}

/// Split, trim and de-duplicate an origin list, keeping input order.
pub(crate) fn parse_origins(raw: &str) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in raw.split(['\n', ',']).map(|o| o.trim().trim_end_matches('/')) {
        if !origin.is_empty() && !origins.iter().any(|seen| seen == origin) {
            origins.push(origin.to_owned());
        }
    }
    origins
}

impl SettingsDraft {
    pub(crate) fn from_form(form: &Form) -> Self {
        Self {
            name: form.name.clone(),
            description: form.description.clone().unwrap_or_default(),
            redirect_url: form.settings.redirect_url.clone().unwrap_or_default(),
            notify_email: form.settings.notify_email.clone().unwrap_or_default(),
            honeypot_field: form.settings.honeypot_field.clone().unwrap_or_default(),
            allowed_origins: form.settings.allowed_origins.join("\n"),
        }
    }

    /// Validated request body, or the first problem found.
    pub(crate) fn to_input(&self) -> Result<FormInput, String> {
        let name = optional(&self.name).ok_or_else(|| "Give the form a name.".to_owned())?;
        let redirect_url = optional(&self.redirect_url);
        if let Some(url) = &redirect_url {
            if !is_http_url(url) {
                return Err("Redirect URL must start with http:// or https://.".to_owned());
            }
        }
        let notify_email = optional(&self.notify_email);
        if let Some(email) = &notify_email {
            crate::pages::credentials::validate_email(email)
                .map_err(|_| "Notification email is not a valid address.".to_owned())?;
        }
        let allowed_origins = parse_origins(&self.allowed_origins);
        if let Some(bad) = allowed_origins.iter().find(|origin| !is_http_url(origin)) {
            return Err(format!("Allowed origin {bad} must start with http:// or https://."));
        }
        Ok(FormInput {
            name,
            description: optional(&self.description),
            settings: FormSettings {
                redirect_url,
                notify_email,
                honeypot_field: optional(&self.honeypot_field),
                allowed_origins,
            },
        })
    }
}

/// Submission fields as display pairs; strings unquoted, other JSON as-is.
pub(crate) fn submission_fields(submission: &Submission) -> Vec<(String, String)> {
    submission
        .data
        .iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

pub(crate) fn page_label(pagination: &Pagination) -> String {
    format!(
        "Page {} of {} ({} total)",
        pagination.page,
        pagination.total_pages.max(1),
        pagination.total
    )
}

#[cfg(feature = "csr")]
fn load_form(
    forms: FormsApi,
    id: String,
    current_id: Memo<Option<String>>,
    form: RwSignal<Option<Form>>,
    draft: RwSignal<SettingsDraft>,
    stats: RwSignal<Option<FormStatistics>>,
    error: RwSignal<Option<String>>,
) {
    leptos::task::spawn_local(async move {
        let loaded = forms.get(&id).await;
        if current_id.get_untracked().as_deref() != Some(id.as_str()) {
            return;
        }
        match loaded {
            Ok(loaded) => {
                draft.set(SettingsDraft::from_form(&loaded));
                form.set(Some(loaded));
                error.set(None);
            }
            Err(e) => {
                error.set(Some(session::extract_error_message(&e)));
                return;
            }
        }
        match forms.statistics(&id).await {
            Ok(loaded) if current_id.get_untracked().as_deref() == Some(id.as_str()) => stats.set(Some(loaded)),
            Ok(_) => {}
            Err(e) => log::warn!("statistics for form {id} unavailable: {e}"),
        }
    });
}

#[cfg(feature = "csr")]
fn load_submissions(
    forms: FormsApi,
    id: String,
    page: u32,
    current_id: Memo<Option<String>>,
    submissions: RwSignal<Option<SubmissionPage>>,
    error: RwSignal<Option<String>>,
) {
    leptos::task::spawn_local(async move {
        let loaded = forms.submissions(&id, page, session::forms::DEFAULT_PAGE_LIMIT).await;
        if current_id.get_untracked().as_deref() != Some(id.as_str()) {
            return;
        }
        match loaded {
            Ok(loaded) => {
                submissions.set(Some(loaded));
                error.set(None);
            }
            Err(e) => error.set(Some(session::extract_error_message(&e))),
        }
    });
}

#[component]
pub fn FormDetailPage() -> impl IntoView {
    let forms = expect_context::<FormsApi>();
    let config = expect_context::<ClientConfig>();
    let params = use_params_map();
    let navigate = use_navigate();

    let form_id = Memo::new(move |_| params.read().get("id"));
    let form = RwSignal::new(None::<Form>);
    let draft = RwSignal::new(SettingsDraft::default());
    let stats = RwSignal::new(None::<FormStatistics>);
    let submissions = RwSignal::new(None::<SubmissionPage>);
    let page = RwSignal::new(1_u32);
    let load_error = RwSignal::new(None::<String>);
    let submissions_error = RwSignal::new(None::<String>);
    let save_status = RwSignal::new(None::<Result<String, String>>);
    let saving = RwSignal::new(false);
    let delete_armed = RwSignal::new(false);
    let copied = RwSignal::new(None::<&'static str>);
    let deleted = RwSignal::new(false);

    // Reset route-scoped state and reload when the id changes.
    let forms_for_form = forms.clone();
    Effect::new(move || {
        let Some(id) = form_id.get() else {
            return;
        };
        form.set(None);
        stats.set(None);
        submissions.set(None);
        save_status.set(None);
        delete_armed.set(false);
        if page.get_untracked() != 1 {
            page.set(1);
        }
        #[cfg(feature = "csr")]
        load_form(forms_for_form.clone(), id, form_id, form, draft, stats, load_error);
        #[cfg(not(feature = "csr"))]
        let _ = (&forms_for_form, id);
    });

    let forms_for_page = forms.clone();
    Effect::new(move || {
        let current_page = page.get();
        let Some(id) = form_id.get() else {
            return;
        };
        #[cfg(feature = "csr")]
        load_submissions(forms_for_page.clone(), id, current_page, form_id, submissions, submissions_error);
        #[cfg(not(feature = "csr"))]
        let _ = (&forms_for_page, id, current_page);
    });

    let forms_for_save = forms.clone();
    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if saving.get() {
            return;
        }
        let Some(id) = form_id.get() else {
            return;
        };
        let input = match draft.get().to_input() {
            Ok(input) => input,
            Err(message) => {
                save_status.set(Some(Err(message)));
                return;
            }
        };
        saving.set(true);
        save_status.set(None);

        #[cfg(feature = "csr")]
        {
            let forms = forms_for_save.clone();
            leptos::task::spawn_local(async move {
                match forms.update(&id, &input).await {
                    Ok(updated) => {
                        draft.set(SettingsDraft::from_form(&updated));
                        form.set(Some(updated));
                        save_status.set(Some(Ok("Settings saved.".to_owned())));
                    }
                    Err(e) => save_status.set(Some(Err(session::extract_error_message(&e)))),
                }
                saving.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&forms_for_save, id, input);
        }
    };

    let on_delete = move |_| {
        if !delete_armed.get() {
            delete_armed.set(true);
            return;
        }
        let Some(id) = form_id.get() else {
            return;
        };

        #[cfg(feature = "csr")]
        {
            let forms = forms.clone();
            leptos::task::spawn_local(async move {
                match forms.delete(&id).await {
                    Ok(()) => deleted.set(true),
                    Err(e) => {
                        delete_armed.set(false);
                        load_error.set(Some(session::extract_error_message(&e)));
                    }
                }
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&forms, id);
        }
    };

    Effect::new(move || {
        if deleted.get() {
            navigate("/dashboard", NavigateOptions::default());
        }
    });

    let base_url = StoredValue::new(config.base_url.clone());
    let endpoint = move || {
        form_id.get().map(|id| base_url.with_value(|base| submission_endpoint(base, &id))).unwrap_or_default()
    };
    let html = move || form.get().map(|f| base_url.with_value(|base| html_snippet(base, &f))).unwrap_or_default();
    let js = move || form.get().map(|f| base_url.with_value(|base| fetch_snippet(base, &f))).unwrap_or_default();

    let copy = move |label: &'static str, text: String| {
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let ok = crate::util::clipboard::copy_text(text).await;
            copied.set(Some(if ok { label } else { "Copy failed" }));
        });
        #[cfg(not(feature = "csr"))]
        let _ = (label, text, copied);
    };

    let field = move |get: fn(&SettingsDraft) -> String, set: fn(&mut SettingsDraft, String)| {
        (move || get(&draft.get()), move |ev: leptos::ev::Event| draft.update(|d| set(d, event_target_value(&ev))))
    };
    let (name_value, name_input) = field(|d| d.name.clone(), |d, v| d.name = v);
    let (description_value, description_input) = field(|d| d.description.clone(), |d, v| d.description = v);
    let (redirect_value, redirect_input) = field(|d| d.redirect_url.clone(), |d, v| d.redirect_url = v);
    let (notify_value, notify_input) = field(|d| d.notify_email.clone(), |d, v| d.notify_email = v);
    let (honeypot_value, honeypot_input) = field(|d| d.honeypot_field.clone(), |d, v| d.honeypot_field = v);
    let (origins_value, origins_input) = field(|d| d.allowed_origins.clone(), |d, v| d.allowed_origins = v);

    view! {
        <div class="form-detail">
            <Show when=move || load_error.get().is_some()>
                <p class="form-detail__error">{move || load_error.get().unwrap_or_default()}</p>
            </Show>
            <Show
                when=move || form.get().is_some()
                fallback=move || {
                    (load_error.get().is_none()).then(|| view! { <p>"Loading form..."</p> })
                }
            >
                <header class="form-detail__header">
                    <h1>{move || form.get().map(|f| f.name).unwrap_or_default()}</h1>
                    <code class="form-detail__endpoint">{endpoint}</code>
                </header>

                <section class="form-detail__stats">
                    {move || {
                        let s = stats.get().unwrap_or_default();
                        view! {
                            <span>{format!("{} total", s.total_submissions)}</span>
                            <span>{format!("{} today", s.submissions_today)}</span>
                            <span>{format!("{} this week", s.submissions_this_week)}</span>
                            <span>
                                {s
                                    .last_submission_at
                                    .map(|at| format!("last at {at}"))
                                    .unwrap_or_else(|| "no submissions yet".to_owned())}
                            </span>
                        }
                    }}
                </section>

                <section class="form-detail__settings">
                    <h2>"Settings"</h2>
                    <form class="settings-form" on:submit=on_save.clone()>
                        <label>"Name" <input class="input" type="text" prop:value=name_value on:input=name_input/></label>
                        <label>
                            "Description"
                            <textarea class="input" prop:value=description_value on:input=description_input></textarea>
                        </label>
                        <label>
                            "Redirect URL"
                            <input class="input" type="url" placeholder="https://example.com/thanks" prop:value=redirect_value on:input=redirect_input/>
                        </label>
                        <label>
                            "Notification email"
                            <input class="input" type="email" prop:value=notify_value on:input=notify_input/>
                        </label>
                        <label>
                            "Honeypot field"
                            <input class="input" type="text" placeholder="_gotcha" prop:value=honeypot_value on:input=honeypot_input/>
                        </label>
                        <label>
                            "Allowed origins (one per line)"
                            <textarea class="input" prop:value=origins_value on:input=origins_input></textarea>
                        </label>
                        <button class="btn" type="submit" disabled=move || saving.get()>
                            {move || if saving.get() { "Saving..." } else { "Save settings" }}
                        </button>
                    </form>
                    {move || {
                        save_status
                            .get()
                            .map(|status| match status {
                                Ok(message) => view! { <p class="settings-form__ok">{message}</p> }.into_any(),
                                Err(message) => view! { <p class="settings-form__error">{message}</p> }.into_any(),
                            })
                    }}
                </section>

                <section class="form-detail__embed">
                    <h2>"Embed"</h2>
                    <pre class="snippet">{html}</pre>
                    <button class="btn" on:click=move |_| copy("HTML copied", html())>"Copy HTML"</button>
                    <pre class="snippet">{js}</pre>
                    <button class="btn" on:click=move |_| copy("JavaScript copied", js())>"Copy JavaScript"</button>
                    <Show when=move || copied.get().is_some()>
                        <span class="snippet__status">{move || copied.get().unwrap_or_default()}</span>
                    </Show>
                </section>

                <section class="form-detail__submissions">
                    <h2>"Submissions"</h2>
                    <Show when=move || submissions_error.get().is_some()>
                        <p class="form-detail__error">{move || submissions_error.get().unwrap_or_default()}</p>
                    </Show>
                    {move || {
                        submissions
                            .get()
                            .map(|loaded| {
                                let pagination = loaded.pagination;
                                let rows = loaded
                                    .submissions
                                    .iter()
                                    .map(|submission| {
                                        let fields = submission_fields(submission)
                                            .into_iter()
                                            .map(|(key, value)| view! { <dt>{key}</dt> <dd>{value}</dd> })
                                            .collect_view();
                                        view! {
                                            <li class="submission">
                                                <span class="submission__time">
                                                    {submission.created_at.clone().unwrap_or_default()}
                                                </span>
                                                <dl class="submission__fields">{fields}</dl>
                                            </li>
                                        }
                                    })
                                    .collect_view();
                                view! {
                                    <ul class="submission-list">{rows}</ul>
                                    <div class="pager">
                                        <button
                                            class="btn"
                                            disabled=!pagination.has_previous()
                                            on:click=move |_| page.update(|p| *p = p.saturating_sub(1).max(1))
                                        >
                                            "Previous"
                                        </button>
                                        <span class="pager__label">{page_label(&pagination)}</span>
                                        <button
                                            class="btn"
                                            disabled=!pagination.has_next()
                                            on:click=move |_| page.update(|p| *p += 1)
                                        >
                                            "Next"
                                        </button>
                                    </div>
                                }
                            })
                    }}
                </section>

                <section class="form-detail__danger">
                    <button class="btn btn--danger" on:click=on_delete.clone()>
                        {move || if delete_armed.get() { "Click again to delete" } else { "Delete form" }}
                    </button>
                </section>
            </Show>
        </div>
    }
}
