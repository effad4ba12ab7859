fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Central proto repo is at ../proto/ relative to core/
    let proto_root = "../proto";
    let info_proto = format!("{proto_root}/koukku/info/v1/info.proto");

    println!("cargo:rerun-if-changed={info_proto}");
    println!("cargo:rerun-if-env-changed=KOUKKU_PROTO_REGEN");

    // Regeneration is opt-in so ordinary builds don't need protoc.
    // Run `KOUKKU_PROTO_REGEN=1 cargo build -p koukku-core` after editing
    // the proto, then commit the refreshed src/proto/ output.
    if std::env::var_os("KOUKKU_PROTO_REGEN").is_none() {
        return Ok(());
    }

    std::fs::create_dir_all("src/proto").ok();

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .out_dir("src/proto")
        .compile_protos(&[&info_proto], &[proto_root])?;

    Ok(())
}
