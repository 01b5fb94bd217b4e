use scatter_ngin::{ConfigSource, SceneConfig};

/// `scatter-ngin [scene.json]`, the path is relative to `./assets`.
fn main() -> anyhow::Result<()> {
    let source = match std::env::args().nth(1) {
        Some(file) => ConfigSource::File(file),
        None => ConfigSource::Inline(SceneConfig::default()),
    };
    scatter_ngin::run(source)
}
