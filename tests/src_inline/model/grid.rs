use super::*;

#[test]
fn test_candidates_are_ensemble_major() {
    let grid = ConfigGrid {
        n_estimators: vec![50, 100],
        contamination: vec![0.01, 0.05],
    };
    let c = grid.candidates();
    assert_eq!(grid.len(), 4);
    assert_eq!(
        c[0],
        CandidateConfig {
            n_estimators: 50,
            contamination: 0.01
        }
    );
    assert_eq!(
        c[1],
        CandidateConfig {
            n_estimators: 50,
            contamination: 0.05
        }
    );
    assert_eq!(c[2].n_estimators, 100);
}

#[test]
fn test_validate_rejects_bad_values() {
    let empty = ConfigGrid {
        n_estimators: vec![],
        contamination: vec![0.05],
    };
    assert_eq!(empty.validate(), Err(ModelError::EmptyGrid));

    let zero = ConfigGrid {
        n_estimators: vec![0],
        contamination: vec![0.05],
    };
    assert_eq!(zero.validate(), Err(ModelError::NoEstimators));

    let cont = ConfigGrid {
        n_estimators: vec![10],
        contamination: vec![0.7],
    };
    assert_eq!(cont.validate(), Err(ModelError::Contamination(0.7)));

    assert!(ConfigGrid::default().validate().is_ok());
}
