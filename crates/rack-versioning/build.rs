//! ---
//! rack_section: "14-versioning"
//! rack_subsection: "build"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Release catalog and build metadata helpers."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Outside a git checkout vergen falls back to placeholder values.
    EmitBuilder::builder()
        .build_timestamp()
        .all_cargo()
        .git_sha(true)
        .emit()?;

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
