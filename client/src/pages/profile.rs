//! Profile page: edit the signed-in user's public profile.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use leptos::prelude::*;
use session::SessionController;
use session::types::{ProfileUpdate, User};

use crate::pages::form_detail::{is_http_url, optional};
use crate::state::auth::AuthState;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ProfileDraft {
    pub name: String,
    pub bio: String,
    pub avatar_url: String,
    pub website: String,
}

impl ProfileDraft {
    pub(crate) fn from_user(user: &User) -> Self {
        let profile = user.profile.clone().unwrap_or_default();
        Self {
            name: profile.name.or_else(|| user.display_name.clone()).unwrap_or_default(),
            bio: profile.bio.unwrap_or_default(),
            avatar_url: profile.avatar_url.unwrap_or_default(),
            website: profile.website.unwrap_or_default(),
        }
    }

    /// Blank fields are omitted from the update and stay unchanged.
    pub(crate) fn to_update(&self) -> Result<ProfileUpdate, &'static str> {
        let avatar_url = optional(&self.avatar_url);
        if avatar_url.as_deref().is_some_and(|url| !is_http_url(url)) {
            return Err("Avatar URL must start with http:// or https://.");
        }
        let website = optional(&self.website);
        if website.as_deref().is_some_and(|url| !is_http_url(url)) {
            return Err("Website must start with http:// or https://.");
        }
        Ok(ProfileUpdate { name: optional(&self.name), bio: optional(&self.bio), avatar_url, website })
    }
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionController>();

    let draft = RwSignal::new(ProfileDraft::default());
    let loaded_for = RwSignal::new(None::<String>);
    let status = RwSignal::new(None::<Result<String, String>>);
    let busy = RwSignal::new(false);

    // Seed the draft once per signed-in user.
    Effect::new(move || {
        let Some(user) = auth.get().user else {
            return;
        };
        if loaded_for.get_untracked().as_deref() == Some(user.id.as_str()) {
            return;
        }
        draft.set(ProfileDraft::from_user(&user));
        loaded_for.set(Some(user.id));
    });

    let session_for_save = session.clone();
    let on_save = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let update = match draft.get().to_update() {
            Ok(update) => update,
            Err(message) => {
                status.set(Some(Err(message.to_owned())));
                return;
            }
        };
        busy.set(true);
        status.set(None);

        #[cfg(feature = "csr")]
        {
            let session = session_for_save.clone();
            leptos::task::spawn_local(async move {
                match session.update_profile(&update).await {
                    Ok(user) => {
                        draft.set(ProfileDraft::from_user(&user));
                        status.set(Some(Ok("Profile updated.".to_owned())));
                    }
                    Err(e) => status.set(Some(Err(e.to_string()))),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&session_for_save, update);
        }
    };

    let on_reload = move |_| {
        if busy.get() {
            return;
        }
        busy.set(true);
        status.set(None);

        #[cfg(feature = "csr")]
        {
            let session = session.clone();
            leptos::task::spawn_local(async move {
                match session.refresh_user().await {
                    Ok(user) => draft.set(ProfileDraft::from_user(&user)),
                    Err(e) => status.set(Some(Err(e.to_string()))),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = &session;
        }
    };

    let text_input = move |get: fn(&ProfileDraft) -> String, set: fn(&mut ProfileDraft, String)| {
        (move || get(&draft.get()), move |ev: leptos::ev::Event| draft.update(|d| set(d, event_target_value(&ev))))
    };
    let (name_value, name_input) = text_input(|d| d.name.clone(), |d, v| d.name = v);
    let (bio_value, bio_input) = text_input(|d| d.bio.clone(), |d, v| d.bio = v);
    let (avatar_value, avatar_input) = text_input(|d| d.avatar_url.clone(), |d, v| d.avatar_url = v);
    let (website_value, website_input) = text_input(|d| d.website.clone(), |d, v| d.website = v);

    view! {
        <div class="profile-page">
            <h1>"Profile"</h1>
            <p class="profile-page__email">{move || auth.get().user.map(|u| u.email).unwrap_or_default()}</p>
            <form class="settings-form" on:submit=on_save>
                <label>"Name" <input class="input" type="text" prop:value=name_value on:input=name_input/></label>
                <label>"Bio" <textarea class="input" prop:value=bio_value on:input=bio_input></textarea></label>
                <label>
                    "Avatar URL"
                    <input class="input" type="url" prop:value=avatar_value on:input=avatar_input/>
                </label>
                <label>
                    "Website"
                    <input class="input" type="url" prop:value=website_value on:input=website_input/>
                </label>
                <button class="btn" type="submit" disabled=move || busy.get()>
                    "Save profile"
                </button>
                <button class="btn btn--secondary" type="button" on:click=on_reload disabled=move || busy.get()>
                    "Reload"
                </button>
            </form>
            {move || {
                status
                    .get()
                    .map(|result| match result {
                        Ok(message) => view! { <p class="settings-form__ok">{message}</p> }.into_any(),
                        Err(message) => view! { <p class="settings-form__error">{message}</p> }.into_any(),
                    })
            }}
        </div>
    }
}
