use instanced_ngin::Config;

/// `instanced-ngin [model.gltf]`
fn main() -> anyhow::Result<()> {
    let config = Config {
        model_url: std::env::args().nth(1),
        ..Config::default()
    };
    instanced_ngin::run(config)
}
