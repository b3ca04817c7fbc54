//! CLI commands implementation

use anyhow::{Context, Result};
use offerlet_core::{FrameworkConfig, FrameworkPolicies, Offer, Requirement};
use offerlet_matcher::{Evaluation, OfferEvaluator, OfferSelection, ScopeNote};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Print the policies derived from the configuration
pub fn check(config: &FrameworkConfig, policies: &FrameworkPolicies) {
    println!("Framework: {}", config.framework.name);
    println!(
        "  Primary role:           {}",
        policies.roles.primary_role().unwrap_or("-")
    );
    println!("  Expected roles:         {}", join(policies.roles.expected_roles()));
    println!(
        "  Default accepted roles: {}",
        join(policies.roles.default_accepted_roles())
    );
    println!(
        "  Features:               {}",
        join(policies.features.iter().map(|f| f.to_string()))
    );
    println!("  GPU scheduling:         {}", policies.gpu.mode());
    println!("Configuration OK");
}

/// Evaluate every offer in `offers_path` against a GPU requirement
pub async fn match_offers(
    policies: &FrameworkPolicies,
    offers_path: &Path,
    gpus: u32,
    scope: String,
) -> Result<()> {
    let requirement = Requirement::gpus(gpus)?;
    let offers = load_offers(offers_path).await?;
    let evaluator = Arc::new(OfferEvaluator::from_policies(policies));

    info!(
        offers = offers.len(),
        required = requirement.required_value,
        "Evaluating offers"
    );

    let evaluations =
        evaluate_concurrently(evaluator, offers.clone(), requirement, ScopeNote::new(scope)).await?;

    for (offer, evaluation) in offers.iter().zip(&evaluations) {
        println!("{:<24} {:<20} {}", offer.id, offer.hostname, evaluation);
    }

    let selection = select_offer(&offers, evaluations);
    print!("{}", render_selection(&selection)?);

    Ok(())
}

/// Pair evaluations back with their offers and pick the one to accept
pub fn select_offer(offers: &[Offer], evaluations: Vec<Evaluation>) -> OfferSelection {
    OfferSelection::from_evaluations(
        offers
            .iter()
            .map(|offer| offer.id.as_str())
            .zip(evaluations),
    )
}

fn render_selection(selection: &OfferSelection) -> Result<String> {
    let mut out = String::new();
    if !selection.declined.is_empty() {
        out.push_str(&format!("\nDecline offers: {}\n", join(&selection.declined)));
    }
    match &selection.selected {
        Some((offer_id, m)) => {
            out.push_str(&format!("\nAccept offer {}:\n", offer_id));
            out.push_str(&serde_json::to_string_pretty(&m.to_consumed_resources())?);
            out.push('\n');
        }
        None => out.push_str("\nNo offer satisfies the requirement; declining all\n"),
    }
    Ok(out)
}

/// Read a JSON array of decoded offers
pub async fn load_offers(path: &Path) -> Result<Vec<Offer>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read offers from {}", path.display()))?;
    let offers: Vec<Offer> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse offers in {}", path.display()))?;
    Ok(offers)
}

/// Evaluate each offer on the blocking pool, returning results in offer order
///
/// Each task owns its offer, so no fragment list is shared between
/// evaluations. Offers violating the fragment invariants are skipped.
pub async fn evaluate_concurrently(
    evaluator: Arc<OfferEvaluator>,
    offers: Vec<Offer>,
    requirement: Requirement,
    scope_note: ScopeNote,
) -> Result<Vec<Evaluation>> {
    let handles: Vec<_> = offers
        .into_iter()
        .map(|offer| {
            let evaluator = Arc::clone(&evaluator);
            let requirement = requirement.clone();
            let scope_note = scope_note.clone();
            tokio::task::spawn_blocking(move || {
                if let Err(e) = offer.validate() {
                    warn!(offer_id = %offer.id, error = %e, "Skipping malformed offer");
                    return Evaluation::Skipped {
                        reason: e.to_string(),
                    };
                }
                evaluator.evaluate(&offer, &requirement, scope_note)
            })
        })
        .collect();

    futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.context("Offer evaluation task failed"))
        .collect()
}

fn join<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offerlet_core::{ResourceFragment, UNRESERVED_ROLE};
    use std::io::Write;

    fn policies() -> FrameworkPolicies {
        FrameworkConfig::from_toml_str(
            r#"
[framework]
role = "gpu-team"
features = ["gpu_resources"]
gpu_scheduling_behavior = "unrestricted"
"#,
        )
        .unwrap()
        .policies()
        .unwrap()
    }

    #[tokio::test]
    async fn test_evaluate_concurrently_keeps_offer_order() {
        let evaluator = Arc::new(OfferEvaluator::from_policies(&policies()));
        let offers = vec![
            Offer::new("o1", "a1").with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, ["g1"])),
            Offer::new("o2", "a2")
                .with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, ["g1", "g2"])),
            Offer::new("o3", "a3")
                .with_fragment("gpus", ResourceFragment::new("gpu-team", ["g1", "g2", "g3"])),
        ];

        let evaluations = evaluate_concurrently(
            evaluator,
            offers,
            Requirement::gpus(2).unwrap(),
            ScopeNote::default(),
        )
        .await
        .unwrap();

        let matched: Vec<bool> = evaluations.iter().map(Evaluation::is_match).collect();
        assert_eq!(matched, vec![false, true, true]);
    }

    #[tokio::test]
    async fn test_selection_accepts_first_match() {
        let evaluator = Arc::new(OfferEvaluator::from_policies(&policies()));
        let offers = vec![
            Offer::new("o1", "a1").with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, ["g1"])),
            Offer::new("o2", "a2")
                .with_fragment("gpus", ResourceFragment::new("gpu-team", ["g1", "g2"])),
            Offer::new("o3", "a3")
                .with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, ["g1", "g2"])),
        ];

        let evaluations = evaluate_concurrently(
            evaluator,
            offers.clone(),
            Requirement::gpus(2).unwrap(),
            ScopeNote::default(),
        )
        .await
        .unwrap();
        let selection = select_offer(&offers, evaluations);

        assert_eq!(selection.declined, vec!["o1".to_string()]);
        let (offer_id, m) = selection.selected.as_ref().unwrap();
        assert_eq!(offer_id, "o2");
        assert_eq!(m.consumed_total(), 2);

        let rendered = render_selection(&selection).unwrap();
        assert!(rendered.contains("Decline offers: o1"));
        assert!(rendered.contains("Accept offer o2:"));
        assert!(rendered.contains("\"gpu-team\""));
    }

    #[test]
    fn test_render_selection_without_match() {
        let selection = OfferSelection {
            selected: None,
            declined: vec!["o1".to_string(), "o2".to_string()],
        };
        let rendered = render_selection(&selection).unwrap();
        assert!(rendered.contains("Decline offers: o1, o2"));
        assert!(rendered.contains("No offer satisfies the requirement"));
    }

    #[tokio::test]
    async fn test_malformed_offer_is_skipped() {
        let evaluator = Arc::new(OfferEvaluator::from_policies(&policies()));
        let offers = vec![Offer::new("bad", "a1")
            .with_fragment("gpus", ResourceFragment::new(UNRESERVED_ROLE, ["g1"]))
            .with_fragment("gpus", ResourceFragment::new("gpu-team", ["g1"]))];

        let evaluations = evaluate_concurrently(
            evaluator,
            offers,
            Requirement::gpus(1).unwrap(),
            ScopeNote::default(),
        )
        .await
        .unwrap();

        assert!(matches!(evaluations[0], Evaluation::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_load_offers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "o1", "hostname": "a1", "resources": [{{"name": "gpus", "role": "unreserved", "unit_ids": ["g1"]}}]}}]"#
        )
        .unwrap();

        let offers = load_offers(file.path()).await.unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].fragments_for("gpus").len(), 1);
    }

    #[tokio::test]
    async fn test_load_offers_missing_file() {
        let result = load_offers(Path::new("/nonexistent/offers.json")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_join() {
        assert_eq!(join(Vec::<String>::new()), "-");
        assert_eq!(join(["a", "b"]), "a, b");
    }
}
