//! Onboarding progress derived from document rows.
//!
//! A client's onboarding is four fixed steps. Nothing about progress is stored:
//! each step takes its status from the documents whose free-text type mentions
//! the step keyword.
//!
//! Two behaviours are kept on purpose and covered by tests:
//!
//! - A document type mentioning several keywords (e.g. `KYC Final Review`)
//!   counts towards every step it mentions.
//! - A step's status comes from the *first* matching row in input order, while
//!   its last-updated time is the *most recent* matching upload. The two can
//!   describe different rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Client, Document, DocumentStatus, Role, User};

/// One of the four onboarding steps, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStep {
    Profile,
    Kyc,
    Insurance,
    Final,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 4] = [
        OnboardingStep::Profile,
        OnboardingStep::Kyc,
        OnboardingStep::Insurance,
        OnboardingStep::Final,
    ];

    /// Lowercase keyword searched for in document types.
    pub fn keyword(&self) -> &'static str {
        match self {
            OnboardingStep::Profile => "profile",
            OnboardingStep::Kyc => "kyc",
            OnboardingStep::Insurance => "insurance",
            OnboardingStep::Final => "final",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            OnboardingStep::Profile => "Profile Verification",
            OnboardingStep::Kyc => "KYC Review",
            OnboardingStep::Insurance => "Insurance Verification",
            OnboardingStep::Final => "Final Approval",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OnboardingStep::Profile => "Verify your business profile information",
            OnboardingStep::Kyc => "Identity documents reviewed by our verification team",
            OnboardingStep::Insurance => "Upload your insurance certificate",
            OnboardingStep::Final => "Final approval once all previous steps are completed",
        }
    }

    /// Whether a document type belongs to this step (case-insensitive substring).
    pub fn matches(&self, document_type: &str) -> bool {
        document_type.to_lowercase().contains(self.keyword())
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Derived state of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub step: OnboardingStep,
    pub status: DocumentStatus,
    pub last_updated: Option<DateTime<Utc>>,
}

impl StepProgress {
    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// Label for the step's action button.
    pub fn action_label(&self) -> &'static str {
        match self.status {
            DocumentStatus::Pending => "Start",
            DocumentStatus::Completed | DocumentStatus::Approved => "View",
            _ => "Continue",
        }
    }
}

/// Derive the four steps from documents in query order.
pub fn derive_steps(documents: &[Document]) -> Vec<StepProgress> {
    OnboardingStep::ALL
        .iter()
        .map(|step| {
            let mut matches = documents.iter().filter(|d| step.matches(&d.document_type));
            let first = matches.next();
            let status = first
                .map(|d| d.status.clone())
                .unwrap_or(DocumentStatus::Pending);
            let last_updated = first
                .map(|d| d.uploaded_at)
                .into_iter()
                .chain(matches.map(|d| d.uploaded_at))
                .max();
            StepProgress {
                step: *step,
                status,
                last_updated,
            }
        })
        .collect()
}

/// Percentage of steps that are done, in `0.0..=100.0`.
pub fn progress_percentage(steps: &[StepProgress]) -> f64 {
    let done = steps.iter().filter(|s| s.is_done()).count();
    done as f64 / OnboardingStep::ALL.len() as f64 * 100.0
}

/// Percentage rounded to a whole number for display.
pub fn display_percentage(percentage: f64) -> u32 {
    percentage.round().clamp(0.0, 100.0) as u32
}

/// First step that is not done yet, or `None` when onboarding is finished.
pub fn current_step(steps: &[StepProgress]) -> Option<&StepProgress> {
    steps.iter().find(|s| !s.is_done())
}

/// Derived onboarding status of a client, shown in admin and service-center lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientStatus {
    Completed,
    InProgress,
    UnderReview,
    Pending,
    Rejected,
}

impl ClientStatus {
    /// Derive from a client's documents and its derived steps.
    pub fn derive(documents: &[Document], steps: &[StepProgress]) -> Self {
        let any = |status: DocumentStatus| documents.iter().any(|d| d.status == status);

        if progress_percentage(steps) >= 100.0 {
            ClientStatus::Completed
        } else if any(DocumentStatus::UnderReview) {
            ClientStatus::UnderReview
        } else if documents.is_empty() || any(DocumentStatus::Pending) {
            ClientStatus::Pending
        } else if any(DocumentStatus::Rejected) {
            ClientStatus::Rejected
        } else {
            ClientStatus::InProgress
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClientStatus::Completed => "Completed",
            ClientStatus::InProgress => "In Progress",
            ClientStatus::UnderReview => "Under Review",
            ClientStatus::Pending => "Pending",
            ClientStatus::Rejected => "Rejected",
        }
    }

    /// Filter value used in query strings.
    pub fn slug(&self) -> &'static str {
        match self {
            ClientStatus::Completed => "completed",
            ClientStatus::InProgress => "in-progress",
            ClientStatus::UnderReview => "under-review",
            ClientStatus::Pending => "pending",
            ClientStatus::Rejected => "rejected",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "completed" => Some(ClientStatus::Completed),
            "in-progress" => Some(ClientStatus::InProgress),
            "under-review" => Some(ClientStatus::UnderReview),
            "pending" => Some(ClientStatus::Pending),
            "rejected" => Some(ClientStatus::Rejected),
            _ => None,
        }
    }
}

/// A client together with everything derived from its documents.
#[derive(Debug, Clone, Serialize)]
pub struct ClientOverview {
    pub client: Client,
    /// The user who created the client record, when known.
    pub owner: Option<User>,
    pub documents: Vec<Document>,
    pub steps: Vec<StepProgress>,
    pub percentage: f64,
    pub status: ClientStatus,
}

impl ClientOverview {
    pub fn build(client: Client, owner: Option<User>, documents: Vec<Document>) -> Self {
        let steps = derive_steps(&documents);
        let percentage = progress_percentage(&steps);
        let status = ClientStatus::derive(&documents, &steps);
        Self {
            client,
            owner,
            documents,
            steps,
            percentage,
            status,
        }
    }

    pub fn owner_email(&self) -> &str {
        self.owner.as_ref().map(|u| u.email.as_str()).unwrap_or("")
    }

    pub fn owner_role(&self) -> Option<Role> {
        self.owner.as_ref().and_then(User::role)
    }

    pub fn count_with_status(&self, status: &DocumentStatus) -> usize {
        self.documents.iter().filter(|d| &d.status == status).count()
    }

    /// Most recent upload, if any.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.documents.iter().map(|d| d.uploaded_at).max()
    }
}

/// Client list filter for the admin "All Clients" page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    /// Case-insensitive substring of business name or owner email.
    pub search: Option<String>,
    /// `None` means all statuses.
    pub status: Option<ClientStatus>,
    /// `None` means all creator roles.
    pub role: Option<Role>,
}

impl ClientFilter {
    /// Build from raw query values; `all` and empty values disable a filter.
    pub fn from_query(search: Option<&str>, status: Option<&str>, role: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let status = status
            .filter(|s| *s != "all")
            .and_then(ClientStatus::from_slug);
        let role = role.filter(|r| *r != "all").and_then(Role::normalize);
        Self {
            search,
            status,
            role,
        }
    }

    pub fn matches(&self, overview: &ClientOverview) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_name = overview.client.business_name.to_lowercase().contains(&needle);
            let in_email = overview.owner_email().to_lowercase().contains(&needle);
            if !in_name && !in_email {
                return false;
            }
        }
        if let Some(status) = self.status
            && overview.status != status
        {
            return false;
        }
        if let Some(role) = self.role
            && overview.owner_role() != Some(role)
        {
            return false;
        }
        true
    }

    pub fn apply(&self, overviews: Vec<ClientOverview>) -> Vec<ClientOverview> {
        overviews.into_iter().filter(|o| self.matches(o)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn doc(document_type: &str, status: &str, day: u32) -> Document {
        Document {
            id: Uuid::new_v4(),
            client_id: None,
            uploaded_by: Uuid::nil(),
            file_name: format!("{document_type}.pdf"),
            file_url: format!("key/{day}"),
            document_type: document_type.to_string(),
            status: DocumentStatus::parse(status),
            uploaded_at: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            file_size: 1024,
            content_type: Some("application/pdf".to_string()),
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    fn step(steps: &[StepProgress], which: OnboardingStep) -> &StepProgress {
        steps.iter().find(|s| s.step == which).unwrap()
    }

    #[test]
    fn test_no_documents_all_pending() {
        let steps = derive_steps(&[]);
        assert_eq!(steps.len(), 4);
        assert!(steps.iter().all(|s| s.status == DocumentStatus::Pending));
        assert!(steps.iter().all(|s| s.last_updated.is_none()));
        assert_eq!(progress_percentage(&steps), 0.0);
    }

    #[test]
    fn test_steps_are_in_display_order() {
        let steps = derive_steps(&[]);
        let order: Vec<_> = steps.iter().map(|s| s.step).collect();
        assert_eq!(order, OnboardingStep::ALL.to_vec());
    }

    #[test]
    fn test_keyword_match_is_case_insensitive_substring() {
        let docs = vec![doc("Business PROFILE form", "approved", 3)];
        let steps = derive_steps(&docs);
        assert_eq!(step(&steps, OnboardingStep::Profile).status, DocumentStatus::Approved);
        assert_eq!(step(&steps, OnboardingStep::Kyc).status, DocumentStatus::Pending);
    }

    #[test]
    fn test_ambiguous_type_counts_for_every_matching_step() {
        let docs = vec![doc("KYC Final Review", "approved", 5)];
        let steps = derive_steps(&docs);
        assert_eq!(step(&steps, OnboardingStep::Kyc).status, DocumentStatus::Approved);
        assert_eq!(step(&steps, OnboardingStep::Final).status, DocumentStatus::Approved);
        assert_eq!(progress_percentage(&steps), 50.0);
    }

    #[test]
    fn test_status_from_first_row_timestamp_from_latest() {
        let docs = vec![
            doc("KYC Documents", "rejected", 2),
            doc("KYC Documents", "approved", 9),
        ];
        let steps = derive_steps(&docs);
        let kyc = step(&steps, OnboardingStep::Kyc);
        assert_eq!(kyc.status, DocumentStatus::Rejected);
        assert_eq!(
            kyc.last_updated,
            Some(Utc.with_ymd_and_hms(2024, 1, 9, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_latest_timestamp_independent_of_order() {
        let docs = vec![
            doc("Insurance Documents", "pending", 20),
            doc("insurance renewal", "approved", 4),
        ];
        let steps = derive_steps(&docs);
        let insurance = step(&steps, OnboardingStep::Insurance);
        assert_eq!(insurance.status, DocumentStatus::Pending);
        assert_eq!(
            insurance.last_updated,
            Some(Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_progress_counts_completed_and_approved() {
        let docs = vec![
            doc("Profile Verification", "completed", 1),
            doc("KYC Documents", "approved", 2),
            doc("Insurance Documents", "under_review", 3),
        ];
        let steps = derive_steps(&docs);
        assert_eq!(progress_percentage(&steps), 50.0);
        assert_eq!(display_percentage(progress_percentage(&steps)), 50);
    }

    #[test]
    fn test_progress_arithmetic_for_each_count() {
        let types = ["profile", "kyc", "insurance", "final"];
        for done in 0..=4 {
            let docs: Vec<_> = types
                .iter()
                .take(done)
                .map(|t| doc(t, "approved", 1))
                .collect();
            let steps = derive_steps(&docs);
            assert_eq!(progress_percentage(&steps), done as f64 / 4.0 * 100.0);
        }
    }

    #[test]
    fn test_display_percentage_rounds() {
        assert_eq!(display_percentage(0.0), 0);
        assert_eq!(display_percentage(74.6), 75);
        assert_eq!(display_percentage(100.0), 100);
    }

    #[test]
    fn test_unrelated_type_is_ignored() {
        let docs = vec![doc("Financial Documents", "approved", 1)];
        let steps = derive_steps(&docs);
        assert_eq!(progress_percentage(&steps), 0.0);
    }

    #[test]
    fn test_action_labels() {
        let mut progress = StepProgress {
            step: OnboardingStep::Kyc,
            status: DocumentStatus::Pending,
            last_updated: None,
        };
        assert_eq!(progress.action_label(), "Start");
        progress.status = DocumentStatus::Approved;
        assert_eq!(progress.action_label(), "View");
        progress.status = DocumentStatus::UnderReview;
        assert_eq!(progress.action_label(), "Continue");
    }

    #[test]
    fn test_current_step_is_first_not_done() {
        let docs = vec![doc("Profile Verification", "approved", 1)];
        let steps = derive_steps(&docs);
        assert_eq!(current_step(&steps).map(|s| s.step), Some(OnboardingStep::Kyc));
    }

    #[test]
    fn test_client_status_mapping() {
        let all_done = vec![
            doc("profile", "approved", 1),
            doc("kyc", "approved", 1),
            doc("insurance", "completed", 1),
            doc("final", "approved", 1),
        ];
        let cases: Vec<(Vec<Document>, ClientStatus)> = vec![
            (vec![], ClientStatus::Pending),
            (all_done, ClientStatus::Completed),
            (
                vec![doc("kyc", "under_review", 1), doc("profile", "pending", 1)],
                ClientStatus::UnderReview,
            ),
            (vec![doc("kyc", "pending", 1)], ClientStatus::Pending),
            (
                vec![doc("kyc", "rejected", 1), doc("profile", "approved", 1)],
                ClientStatus::Rejected,
            ),
            (vec![doc("profile", "approved", 1)], ClientStatus::InProgress),
        ];
        for (docs, expected) in cases {
            let steps = derive_steps(&docs);
            assert_eq!(ClientStatus::derive(&docs, &steps), expected, "{docs:?}");
        }
    }

    #[test]
    fn test_client_status_slugs_round_trip() {
        for status in [
            ClientStatus::Completed,
            ClientStatus::InProgress,
            ClientStatus::UnderReview,
            ClientStatus::Pending,
            ClientStatus::Rejected,
        ] {
            assert_eq!(ClientStatus::from_slug(status.slug()), Some(status));
        }
        assert_eq!(ClientStatus::from_slug("all"), None);
    }

    fn overview(name: &str, email: &str, role: &str, docs: Vec<Document>) -> ClientOverview {
        let owner = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: name.to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        };
        let client = Client {
            id: Uuid::new_v4(),
            business_name: name.to_string(),
            created_at: Utc::now(),
            created_by: Some(owner.id),
        };
        ClientOverview::build(client, Some(owner), docs)
    }

    #[test]
    fn test_filter_search_matches_name_or_email() {
        let acme = overview("Acme Corp", "ops@acme.io", "Client", vec![]);
        let filter = ClientFilter::from_query(Some("acme"), None, None);
        assert!(filter.matches(&acme));
        let filter = ClientFilter::from_query(Some("OPS@"), None, None);
        assert!(filter.matches(&acme));
        let filter = ClientFilter::from_query(Some("globex"), None, None);
        assert!(!filter.matches(&acme));
    }

    #[test]
    fn test_filter_all_disables_filters() {
        let filter = ClientFilter::from_query(Some("  "), Some("all"), Some("all"));
        assert_eq!(filter, ClientFilter::default());
    }

    #[test]
    fn test_filter_by_status_and_role() {
        let pending = overview("A", "a@x.io", "Client", vec![]);
        let in_progress = overview("B", "b@x.io", "service", vec![doc("kyc", "approved", 1)]);
        let all = vec![pending, in_progress];

        let filter = ClientFilter::from_query(None, Some("pending"), None);
        let hits = filter.apply(all.clone());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].client.business_name, "A");

        let filter = ClientFilter::from_query(None, None, Some("service"));
        let hits = filter.apply(all);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].client.business_name, "B");
    }
}
