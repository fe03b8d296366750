// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Build Script for fundbot-core
//!
//! Compiles `../../proto/ifundrobot.proto` into tonic server and client
//! stubs. The generated code lands in `OUT_DIR` and is pulled in with
//! `tonic::include_proto!("ifundrobot")` in `src/presentation/grpc/server.rs`.
//!
//! `protoc` comes from `protoc-bin-vendored`, so no system install is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["../../proto/ifundrobot.proto"], &["../../proto"])?;

    println!("cargo:rerun-if-changed=../../proto/ifundrobot.proto");

    Ok(())
}
