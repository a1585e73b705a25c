use instanced_ngin::{
    ObjectKind, Scene, SceneConfig,
    data_structures::entity::Entity,
    input::{InputState, PointerLockRequest},
};
use winit::{event::WindowEvent, keyboard::KeyCode};

#[test]
fn should_ignore_pointer_motion_until_locked() {
    let mut input = InputState::new();
    input.add_pointer_delta(10.0, 5.0);
    assert_eq!(input.take_pointer_delta(), (0.0, 0.0));

    input.set_pointer_locked(true);
    input.add_pointer_delta(10.0, 5.0);
    input.add_pointer_delta(2.0, -1.0);
    assert_eq!(input.take_pointer_delta(), (12.0, 4.0));
    assert_eq!(input.take_pointer_delta(), (0.0, 0.0));
}

#[test]
fn should_release_pointer_and_keys_on_focus_loss() {
    let mut input = InputState::new();
    input.set_pointer_locked(true);
    input.set_key(KeyCode::KeyW, true);

    input.handle_window_event(&WindowEvent::Focused(false));

    assert!(!input.is_key_down(KeyCode::KeyW));
    assert_eq!(input.take_lock_request(), Some(PointerLockRequest::Release));
    assert_eq!(input.take_lock_request(), None);
}

#[test]
fn should_build_default_scene() {
    let config = SceneConfig::default();
    let mut scene = Scene::new(&config);
    let mut input = InputState::new();

    let batch = scene.update(0.0, &mut input).unwrap();
    assert_eq!(batch.len(), 20 + 20 * 20 + 5);
    assert_eq!(
        batch.counts().collect::<Vec<_>>(),
        vec![
            (ObjectKind::Triangle, 20),
            (ObjectKind::Quad, 400),
            (ObjectKind::Cube, 5)
        ]
    );
    assert_eq!(scene.capacity(), 1024);
    assert_eq!(scene.entities(ObjectKind::Cube).len(), 5);
}

#[test]
fn should_move_forwards_with_w() {
    let config = SceneConfig::default();
    let mut scene = Scene::new(&config);
    let mut input = InputState::new();
    input.set_key(KeyCode::KeyW, true);

    scene.update(0.5, &mut input).unwrap();

    let position = scene.camera().position;
    assert!((position.x - (-5.0 + 0.9)).abs() < 1e-5);
    assert!(position.y.abs() < 1e-5);
    assert!((position.z - 0.5).abs() < 1e-5);
}

#[test]
fn should_strafe_with_a_and_d() {
    let config = SceneConfig::default();
    let mut scene = Scene::new(&config);
    let mut input = InputState::new();

    input.set_key(KeyCode::KeyD, true);
    scene.update(1.0, &mut input).unwrap();
    assert!((scene.camera().position.y + 1.8).abs() < 1e-5);

    input.set_key(KeyCode::KeyD, false);
    input.set_key(KeyCode::KeyA, true);
    scene.update(1.0, &mut input).unwrap();
    assert!(scene.camera().position.y.abs() < 1e-5);
}

#[test]
fn should_turn_camera_with_locked_pointer() {
    let config = SceneConfig::default();
    let mut scene = Scene::new(&config);
    let mut input = InputState::new();
    input.set_pointer_locked(true);
    input.add_pointer_delta(-100.0, 0.0);

    scene.update(0.0, &mut input).unwrap();
    assert!((scene.camera().yaw() - 10.0).abs() < 1e-4);
}

#[test]
fn should_fail_when_scene_exceeds_capacity() {
    let config = SceneConfig {
        capacity: 2,
        ..SceneConfig::default()
    };
    let groups = vec![(
        ObjectKind::Cube,
        (0..3).map(|i| Entity::fixed([i as f32, 0.0, 0.0])).collect(),
    )];
    let mut scene = Scene::from_groups(groups, &config);

    let err = scene.update(0.0, &mut InputState::new()).unwrap_err();
    assert_eq!(err.requested, 3);
    assert_eq!(err.capacity, 2);
}

#[test]
fn should_pack_groups_in_kind_order() {
    let config = SceneConfig::default();
    let groups = vec![
        (ObjectKind::Cube, vec![Entity::fixed([1.0, 0.0, 0.0])]),
        (ObjectKind::Triangle, vec![Entity::fixed([2.0, 0.0, 0.0])]),
    ];
    let mut scene = Scene::from_groups(groups, &config);

    let batch = scene.update(0.0, &mut InputState::new()).unwrap();
    assert_eq!(batch.ranges()[0].kind, ObjectKind::Triangle);
    assert_eq!(batch.range(ObjectKind::Cube).unwrap().first_instance, 1);
}
