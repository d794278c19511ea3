use control_library::{
    instantiate, instantiate_from_selection, InstantiateOptions, LibraryEntry, LibraryError,
    MemoryScene, SceneRead, WorldTransform,
};
use control_library::record::decode_record;
use glam::DVec3;

const EPS: f64 = 1e-9;

fn circle() -> LibraryEntry {
    let json = control_test_fixtures::curves::json("circle").expect("circle fixture");
    decode_record(&json).expect("decode circle")
}

/// A target at world (1,2,3) / (0,90,0) buried under a rotated, scaled, offset parent.
fn nested_target(scene: &mut MemoryScene) -> control_library::NodeId {
    let parent_world = WorldTransform {
        scale: DVec3::splat(2.0),
        ..WorldTransform::from_translation_euler_deg(
            DVec3::new(-4.0, 1.0, 7.0),
            DVec3::new(30.0, -15.0, 45.0),
        )
    };
    let rig = scene
        .add_transform("rig", None, parent_world)
        .unwrap();
    let target_world =
        WorldTransform::from_translation_euler_deg(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.0, 90.0, 0.0));
    let target = scene
        .add_transform("hand", Some(rig), WorldTransform::IDENTITY)
        .unwrap();
    let local = WorldTransform {
        scale: DVec3::splat(0.5),
        ..target_world
    }
    .relative_to(&parent_world);
    scene.set_local_transform(target, local).unwrap();
    target
}

#[test]
fn without_targets_builds_one_curve_at_origin() {
    let mut scene = MemoryScene::new();
    let entry = circle();
    let made = instantiate(&mut scene, &entry, &[], &InstantiateOptions::default()).unwrap();

    assert_eq!(made.len(), 1);
    assert_eq!(made[0].name, "circle");
    assert_eq!(made[0].group, None);
    assert!(scene
        .world_transform(&made[0].curve)
        .unwrap()
        .abs_diff_eq(&WorldTransform::IDENTITY, EPS));
    assert_eq!(scene.curve_of(made[0].curve), Some(entry.curve()));
}

#[test]
fn matches_target_world_transform_through_parent_chain() {
    let mut scene = MemoryScene::new();
    let target = nested_target(&mut scene);
    let made = instantiate(&mut scene, &circle(), &[target], &InstantiateOptions::default()).unwrap();

    assert_eq!(made.len(), 1);
    assert_eq!(made[0].name, "hand_ctl");
    let got = scene.world_transform(&made[0].curve).unwrap();
    let expected =
        WorldTransform::from_translation_euler_deg(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.0, 90.0, 0.0));
    assert!(got.abs_diff_eq(&expected, 1e-9), "got {got:?}");
}

#[test]
fn offset_group_carries_placement_and_zeroes_curve() {
    let mut scene = MemoryScene::new();
    let target = nested_target(&mut scene);
    let opts = InstantiateOptions::default().with_offset_group(true);
    let made = instantiate(&mut scene, &circle(), &[target], &opts).unwrap();

    let group = made[0].group.expect("offset group");
    assert_eq!(scene.name_of(&group).unwrap(), "hand_ctl_grp");
    assert_eq!(scene.parent(&made[0].curve).unwrap(), Some(group));
    assert_eq!(
        scene.local_transform(made[0].curve),
        Some(WorldTransform::IDENTITY)
    );

    let target_world = scene.world_transform(&target).unwrap().without_scale();
    assert!(scene
        .world_transform(&group)
        .unwrap()
        .abs_diff_eq(&target_world, EPS));
    assert!(scene
        .world_transform(&made[0].curve)
        .unwrap()
        .abs_diff_eq(&target_world, EPS));
}

#[test]
fn one_curve_per_selected_target() {
    let mut scene = MemoryScene::new();
    let a = scene
        .add_transform("l_foot", None, WorldTransform::from_translation(DVec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    let b = scene
        .add_transform("r_foot", None, WorldTransform::from_translation(DVec3::new(-1.0, 0.0, 0.0)))
        .unwrap();
    scene.select(&[a, b]);

    let made = instantiate_from_selection(&mut scene, &circle(), &InstantiateOptions::default()).unwrap();
    let names: Vec<&str> = made.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["l_foot_ctl", "r_foot_ctl"]);
    assert!(scene
        .world_transform(&made[1].curve)
        .unwrap()
        .translation
        .abs_diff_eq(DVec3::new(-1.0, 0.0, 0.0), EPS));
}

#[test]
fn custom_suffixes_name_curve_and_group() {
    let mut scene = MemoryScene::new();
    let t = scene
        .add_transform("spine", None, WorldTransform::IDENTITY)
        .unwrap();
    let opts = InstantiateOptions {
        offset_group: true,
        curve_suffix: "_CTRL".into(),
        group_suffix: "_OFS".into(),
    };
    let made = instantiate(&mut scene, &circle(), &[t], &opts).unwrap();
    assert_eq!(made[0].name, "spine_CTRL");
    assert_eq!(scene.name_of(&made[0].group.unwrap()).unwrap(), "spine_CTRL_OFS");
}

#[test]
fn repeated_instantiation_keeps_names_unique() {
    let mut scene = MemoryScene::new();
    let t = scene
        .add_transform("head", None, WorldTransform::IDENTITY)
        .unwrap();
    let first = instantiate(&mut scene, &circle(), &[t], &InstantiateOptions::default()).unwrap();
    let second = instantiate(&mut scene, &circle(), &[t], &InstantiateOptions::default()).unwrap();
    assert_eq!(first[0].name, "head_ctl");
    assert_ne!(second[0].name, first[0].name);
}

#[test]
fn invalid_entry_is_refused() {
    let mut scene = MemoryScene::new();
    let mut entry = circle();
    entry.1.knots.truncate(2);
    let err = instantiate(&mut scene, &entry, &[], &InstantiateOptions::default()).unwrap_err();
    assert!(matches!(err, LibraryError::InvalidCurve(_)));
}
