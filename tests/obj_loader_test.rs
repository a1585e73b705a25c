use instanced_ngin::resources::obj::{ObjError, load_obj_vertices, parse_obj};

const QUAD_OBJ: &str = "\
# unit quad
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
";

#[test]
fn should_fan_triangulate_quad_faces() {
    let vertices = parse_obj(QUAD_OBJ).unwrap();

    assert_eq!(vertices.len(), 6);
    let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
    assert_eq!(
        positions,
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]
    );
}

#[test]
fn should_flip_texture_v() {
    let vertices = parse_obj(QUAD_OBJ).unwrap();

    assert_eq!(vertices[0].tex_coords, [0.0, 1.0]);
    assert_eq!(vertices[2].tex_coords, [1.0, 0.0]);
    assert_eq!(vertices[5].tex_coords, [0.0, 0.0]);
}

#[test]
fn should_default_missing_texture_coordinates() {
    let vertices = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

    assert_eq!(vertices.len(), 3);
    assert!(vertices.iter().all(|v| v.tex_coords == [0.0, 1.0]));
}

#[test]
fn should_fail_without_faces() {
    assert!(matches!(parse_obj("# nothing here\n"), Err(ObjError::Empty)));
}

#[tokio::test]
async fn should_load_obj_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quad.obj");
    std::fs::write(&path, QUAD_OBJ).unwrap();

    let vertices = load_obj_vertices(&path.to_string_lossy()).await.unwrap();
    assert_eq!(vertices.len(), 6);
}

#[tokio::test]
async fn should_fail_when_obj_file_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let url = dir.path().join("absent.obj").to_string_lossy().into_owned();

    match load_obj_vertices(&url).await {
        Err(ObjError::Fetch { url: failed, .. }) => assert_eq!(failed, url),
        other => panic!("expected a fetch error, got {:?}", other.map(|v| v.len())),
    }
}
