//! Dashboard aggregation across all of the user's forms.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use crate::error::ApiError;
use crate::forms::FormsApi;
use crate::types::{Form, FormStatistics};

/// One dashboard row.
#[derive(Clone, Debug, PartialEq)]
pub struct FormSummary {
    pub form: Form,
    pub stats: FormStatistics,
    /// `false` when the statistics call failed and `stats` are zeros.
    pub stats_loaded: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardSummary {
    pub form_count: usize,
    pub total_submissions: u64,
    pub submissions_today: u64,
    pub submissions_this_week: u64,
    /// Form id with the most submissions, if any form has one.
    pub busiest_form: Option<String>,
    pub forms: Vec<FormSummary>,
}

/// Fold rows into totals.
#[must_use]
pub fn summarize(forms: Vec<FormSummary>) -> DashboardSummary {
    let busiest_form = forms
        .iter()
        .filter(|row| row.stats.total_submissions > 0)
        .max_by_key(|row| row.stats.total_submissions)
        .map(|row| row.form.id.clone());
    DashboardSummary {
        form_count: forms.len(),
        total_submissions: forms.iter().map(|row| row.stats.total_submissions).fold(0, u64::saturating_add),
        submissions_today: forms.iter().map(|row| row.stats.submissions_today).fold(0, u64::saturating_add),
        submissions_this_week: forms.iter().map(|row| row.stats.submissions_this_week).fold(0, u64::saturating_add),
        busiest_form,
        forms,
    }
}

/// List forms and fetch statistics for each, sequentially.
///
/// A statistics failure degrades that row to zeros.
///
/// # Errors
///
/// Returns the [`ApiError`] from listing forms.
pub async fn load_dashboard(api: &FormsApi) -> Result<DashboardSummary, ApiError> {
    let forms = api.list().await?;
    let mut rows = Vec::with_capacity(forms.len());
    for form in forms {
        let (stats, stats_loaded) = match api.statistics(&form.id).await {
            Ok(stats) => (stats, true),
            Err(e) => {
                tracing::warn!(form_id = %form.id, error = %e, "form statistics unavailable");
                (FormStatistics::default(), false)
            }
        };
        rows.push(FormSummary { form, stats, stats_loaded });
    }
    Ok(summarize(rows))
}
