use cgmath::{InnerSpace, Point3, Vector3, Vector4};
use instanced_ngin::camera::{Camera, FrameUniform, Projection};

fn assert_close(actual: Vector3<f32>, expected: Vector3<f32>) {
    assert!(
        (actual - expected).magnitude() < 1e-5,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[test]
fn should_look_along_x_at_zero_angles() {
    let camera = Camera::new([-5.0, 0.0, 0.5], 0.0, 0.0);

    assert_close(camera.forwards(), Vector3::unit_x());
    assert_close(camera.right(), -Vector3::unit_y());
    assert_close(camera.up(), Vector3::unit_z());

    // A point straight ahead ends up on the view axis, in front of the camera.
    let ahead = camera.view() * Vector4::new(0.0, 0.0, 0.5, 1.0);
    assert!(ahead.x.abs() < 1e-5 && ahead.y.abs() < 1e-5);
    assert!((ahead.z + 5.0).abs() < 1e-5);
}

#[test]
fn should_turn_left_with_yaw() {
    let mut camera = Camera::new([0.0, 0.0, 0.0], 90.0, 0.0);
    camera.update();
    assert_close(camera.forwards(), Vector3::unit_y());
}

#[test]
fn should_clamp_pitch_and_wrap_yaw() {
    let mut camera = Camera::new([0.0, 0.0, 0.0], 0.0, 0.0);
    camera.rotate(0.0, -2000.0, 0.1);
    assert_eq!(camera.pitch(), 90.0);
    camera.rotate(0.0, 4000.0, 0.1);
    assert_eq!(camera.pitch(), -90.0);

    camera.rotate(-3700.0, 0.0, 0.1);
    assert!((camera.yaw() - 10.0).abs() < 1e-3);

    // Looking straight down still yields a usable basis.
    camera.update();
    assert!(camera.right().magnitude() > 0.99);
    assert!(camera.view().x.x.is_finite());
}

#[test]
fn should_translate_along_basis() {
    let mut camera = Camera::new([-5.0, 0.0, 0.5], 0.0, 0.0);
    camera.translate(0.0, 2.0);
    assert_eq!(camera.position, Point3::new(-3.0, 0.0, 0.5));
    camera.translate(1.0, 0.0);
    assert_eq!(camera.position, Point3::new(-3.0, -1.0, 0.5));
}

#[test]
fn should_fill_frame_uniform() {
    let camera = Camera::new([-5.0, 0.0, 0.5], 0.0, 0.0);
    let projection = Projection::standard(800, 600);
    let mut uniform = FrameUniform::new();
    uniform.update(&camera, &projection);

    let view: [[f32; 4]; 4] = camera.view().into();
    let proj: [[f32; 4]; 4] = projection.calc_matrix().into();
    assert_eq!(uniform.view, view);
    assert_eq!(uniform.projection, proj);
    assert_eq!(std::mem::size_of::<FrameUniform>(), 128);
    assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
}

#[test]
fn should_map_near_and_far_to_wgpu_depth() {
    let projection = Projection::standard(100, 100);
    let m = projection.calc_matrix();
    let near = m * Vector4::new(0.0, 0.0, -0.1, 1.0);
    let far = m * Vector4::new(0.0, 0.0, -100.0, 1.0);
    assert!((near.z / near.w).abs() < 1e-4);
    assert!((far.z / far.w - 1.0).abs() < 1e-4);
}
