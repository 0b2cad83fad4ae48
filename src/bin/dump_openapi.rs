use std::fs;

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/intranet-rbac-openapi.json".to_string());

    let doc = intranet_rbac::docs::build_openapi(8000)?;
    fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
    println!("wrote {}", path);
    Ok(())
}
