use serde::{Deserialize, Serialize};

/// Stages of one deployment run, in execution order. The feature and
/// verification stages are optional; the transition function skips them when
/// the plan did not request them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployStage {
    DeployCutFacet,
    DeployDiamond,
    DeployLoupeFacet,
    DeployOwnershipFacet,
    AttachLoupe,
    AttachOwnership,
    DeployFeatureFacet,
    AttachFeatureFacet,
    VerifySources,
    Done,
}

/// Advance the stage machine by one step. `Done` is terminal.
pub fn next_stage(
    current: DeployStage,
    feature_requested: bool,
    verify_requested: bool,
) -> DeployStage {
    match current {
        DeployStage::DeployCutFacet => DeployStage::DeployDiamond,
        DeployStage::DeployDiamond => DeployStage::DeployLoupeFacet,
        DeployStage::DeployLoupeFacet => DeployStage::DeployOwnershipFacet,
        DeployStage::DeployOwnershipFacet => DeployStage::AttachLoupe,
        DeployStage::AttachLoupe => DeployStage::AttachOwnership,
        DeployStage::AttachOwnership if feature_requested => DeployStage::DeployFeatureFacet,
        DeployStage::AttachOwnership if verify_requested => DeployStage::VerifySources,
        DeployStage::AttachOwnership => DeployStage::Done,
        DeployStage::DeployFeatureFacet => DeployStage::AttachFeatureFacet,
        DeployStage::AttachFeatureFacet if verify_requested => DeployStage::VerifySources,
        DeployStage::AttachFeatureFacet => DeployStage::Done,
        DeployStage::VerifySources => DeployStage::Done,
        DeployStage::Done => DeployStage::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::{next_stage, DeployStage};

    fn walk(feature_requested: bool, verify_requested: bool) -> Vec<DeployStage> {
        let mut stages = vec![DeployStage::DeployCutFacet];
        loop {
            let current = *stages.last().expect("walk starts non-empty");
            if current == DeployStage::Done {
                return stages;
            }
            stages.push(next_stage(current, feature_requested, verify_requested));
        }
    }

    #[test]
    fn foundational_run_walks_six_stages_then_completes() {
        assert_eq!(
            walk(false, false),
            vec![
                DeployStage::DeployCutFacet,
                DeployStage::DeployDiamond,
                DeployStage::DeployLoupeFacet,
                DeployStage::DeployOwnershipFacet,
                DeployStage::AttachLoupe,
                DeployStage::AttachOwnership,
                DeployStage::Done,
            ]
        );
    }

    #[test]
    fn feature_stages_follow_the_foundational_attachments() {
        let stages = walk(true, false);
        assert_eq!(
            &stages[5..],
            &[
                DeployStage::AttachOwnership,
                DeployStage::DeployFeatureFacet,
                DeployStage::AttachFeatureFacet,
                DeployStage::Done,
            ]
        );
    }

    #[test]
    fn verification_runs_last_in_both_shapes() {
        let foundational = walk(false, true);
        assert_eq!(
            &foundational[foundational.len() - 2..],
            &[DeployStage::VerifySources, DeployStage::Done]
        );

        let full = walk(true, true);
        assert_eq!(
            &full[full.len() - 3..],
            &[
                DeployStage::AttachFeatureFacet,
                DeployStage::VerifySources,
                DeployStage::Done,
            ]
        );
    }

    #[test]
    fn done_is_terminal() {
        assert_eq!(next_stage(DeployStage::Done, true, true), DeployStage::Done);
    }
}
