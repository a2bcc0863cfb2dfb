use std::path::PathBuf;

use vitrine_state::{ModelCatalog, ModelEntry, ViewSettings, ViewerState};

fn three_model_viewer() -> ViewerState<&'static str> {
    let entries = vec![
        ModelEntry::new(PathBuf::from("models/a.gltf"), "a".to_string()),
        ModelEntry::new(PathBuf::from("models/b.gltf"), "b".to_string()),
        ModelEntry::new(PathBuf::from("models/c.gltf"), "c".to_string()),
    ];
    let catalog = ModelCatalog::new(entries).unwrap();
    ViewerState::new(catalog, ViewSettings::default())
}

fn commit_next(v: &mut ViewerState<&'static str>, scene: &'static str) {
    let req = v.request_next().expect("viewer should be idle");
    assert!(v.complete_load(req.ticket, scene), "ticket should still be current");
}

fn commit_previous(v: &mut ViewerState<&'static str>, scene: &'static str) {
    let req = v.request_previous().expect("viewer should be idle");
    assert!(v.complete_load(req.ticket, scene), "ticket should still be current");
}

#[cfg(test)]
mod browse_cycle_tests {
    use super::*;

    #[test]
    fn test_three_model_walkthrough() {
        let mut v = three_model_viewer();
        assert_eq!(v.current_index(), 0);
        assert_eq!(v.current_name(), "a");

        commit_next(&mut v, "scene-b");
        assert_eq!(v.current_index(), 1);
        assert_eq!(v.current_name(), "b");
        assert_eq!(v.scene(), Some(&"scene-b"));

        commit_previous(&mut v, "scene-a");
        assert_eq!(v.current_index(), 0);
        assert_eq!(v.current_name(), "a");

        commit_previous(&mut v, "scene-c");
        assert_eq!(v.current_index(), 2, "previous from 0 should wrap to the last model");
        assert_eq!(v.current_name(), "c");
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let mut v = three_model_viewer();
        for scene in ["scene-b", "scene-c", "scene-a"] {
            commit_next(&mut v, scene);
        }
        assert_eq!(v.current_index(), 0, "three next steps should return to the start");
        assert_eq!(v.current_name(), "a");
    }

    #[test]
    fn test_loading_flag_spans_exactly_the_load() {
        let mut v = three_model_viewer();
        assert!(!v.is_loading());

        let req = v.request_next().unwrap();
        assert!(v.is_loading(), "loading should be visible right after the request");

        assert!(v.complete_load(req.ticket, "scene-b"));
        assert!(!v.is_loading(), "loading should clear on completion");

        let req = v.request_next().unwrap();
        assert!(v.is_loading());
        assert!(v.fail_load(req.ticket, "boom"));
        assert!(!v.is_loading(), "loading should clear on failure");
    }
}

#[cfg(test)]
mod zoom_tests {
    use super::*;

    #[test]
    fn test_zoom_in_multiplies_by_factor() {
        let mut v = three_model_viewer();
        assert!((v.scale() - 0.1).abs() < 1e-6);

        v.zoom_in();

        assert!(
            (v.scale() - 0.12).abs() < 1e-6,
            "0.1 zoomed by 1.2 should be ~0.12, got {}",
            v.scale()
        );
    }

    #[test]
    fn test_zoom_round_trip_restores_scale() {
        let mut v = three_model_viewer();
        let before = v.scale();

        v.zoom_in();
        v.zoom_out();

        assert!(
            (v.scale() - before).abs() < 1e-6,
            "zoom in then out should restore the scale, got {}",
            v.scale()
        );
    }

    #[test]
    fn test_commit_resets_zoom_to_default() {
        let mut v = three_model_viewer();
        v.zoom_in();
        v.zoom_in();
        assert!(v.scale() > 0.1);

        commit_next(&mut v, "scene-b");

        assert!(
            (v.scale() - 0.1).abs() < 1e-6,
            "a committed transition should reset the scale to the default"
        );
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_failed_load_is_fully_recoverable() {
        let mut v = three_model_viewer();
        commit_next(&mut v, "scene-b");

        let req = v.request_next().unwrap();
        assert!(v.fail_load(req.ticket, "unreadable file"));

        assert_eq!(v.current_index(), 1, "failure must not move the index");
        assert_eq!(v.current_name(), "b");
        assert_eq!(v.scene(), Some(&"scene-b"), "failure must not drop the scene");
        assert_eq!(v.last_failure(), Some("unreadable file"));

        commit_next(&mut v, "scene-c");
        assert_eq!(v.current_index(), 2, "the viewer should recover on the next request");
        assert!(v.last_failure().is_none());
    }
}
