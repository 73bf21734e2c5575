//! Hand-assembled WASM modules shared by the unit tests.

/// `(module)` with no sections.
pub const EMPTY_MODULE: &[u8] = &[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];

/// Registers two listeners through the Extism kernel.
///
/// ```wat
/// (module
///   (import "extism:host/env" "alloc" (func $alloc (param i64) (result i64)))
///   (import "extism:host/env" "store_u8" (func $store_u8 (param i64 i32)))
///   (import "extism:host/env" "output_set" (func $output_set (param i64 i64)))
///   (memory 1)
///   (data (i32.const 0) "[\"kafka\",\"audit\"]")
///   (func (export "listeners") (result i32) (local $dst i64) (local $i i32)
///     ;; alloc 17 bytes, copy the data segment byte by byte, output_set
///     ...
///     i32.const 0)
///   (func (export "handle_block_event") (result i32) i32.const 0))
/// ```
pub const LISTENERS_MODULE: &[u8] = &[
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, 0x01, 0x14, 0x04, 0x60,
    0x01, 0x7e, 0x01, 0x7e, 0x60, 0x02, 0x7e, 0x7f, 0x00, 0x60, 0x02, 0x7e,
    0x7e, 0x00, 0x60, 0x00, 0x01, 0x7f, 0x02, 0x51, 0x03, 0x0f, 0x65, 0x78,
    0x74, 0x69, 0x73, 0x6d, 0x3a, 0x68, 0x6f, 0x73, 0x74, 0x2f, 0x65, 0x6e,
    0x76, 0x05, 0x61, 0x6c, 0x6c, 0x6f, 0x63, 0x00, 0x00, 0x0f, 0x65, 0x78,
    0x74, 0x69, 0x73, 0x6d, 0x3a, 0x68, 0x6f, 0x73, 0x74, 0x2f, 0x65, 0x6e,
    0x76, 0x08, 0x73, 0x74, 0x6f, 0x72, 0x65, 0x5f, 0x75, 0x38, 0x00, 0x01,
    0x0f, 0x65, 0x78, 0x74, 0x69, 0x73, 0x6d, 0x3a, 0x68, 0x6f, 0x73, 0x74,
    0x2f, 0x65, 0x6e, 0x76, 0x0a, 0x6f, 0x75, 0x74, 0x70, 0x75, 0x74, 0x5f,
    0x73, 0x65, 0x74, 0x00, 0x02, 0x03, 0x03, 0x02, 0x03, 0x03, 0x05, 0x03,
    0x01, 0x00, 0x01, 0x07, 0x22, 0x02, 0x09, 0x6c, 0x69, 0x73, 0x74, 0x65,
    0x6e, 0x65, 0x72, 0x73, 0x00, 0x03, 0x12, 0x68, 0x61, 0x6e, 0x64, 0x6c,
    0x65, 0x5f, 0x62, 0x6c, 0x6f, 0x63, 0x6b, 0x5f, 0x65, 0x76, 0x65, 0x6e,
    0x74, 0x00, 0x04, 0x0a, 0x3e, 0x02, 0x37, 0x02, 0x01, 0x7e, 0x01, 0x7f,
    0x42, 0x11, 0x10, 0x00, 0x21, 0x00, 0x02, 0x40, 0x03, 0x40, 0x20, 0x01,
    0x41, 0x11, 0x4f, 0x0d, 0x01, 0x20, 0x00, 0x20, 0x01, 0xad, 0x7c, 0x20,
    0x01, 0x2d, 0x00, 0x00, 0x10, 0x01, 0x20, 0x01, 0x41, 0x01, 0x6a, 0x21,
    0x01, 0x0c, 0x00, 0x0b, 0x0b, 0x20, 0x00, 0x42, 0x11, 0x10, 0x02, 0x41,
    0x00, 0x0b, 0x04, 0x00, 0x41, 0x00, 0x0b, 0x0b, 0x17, 0x01, 0x00, 0x41,
    0x00, 0x0b, 0x11, 0x5b, 0x22, 0x6b, 0x61, 0x66, 0x6b, 0x61, 0x22, 0x2c,
    0x22, 0x61, 0x75, 0x64, 0x69, 0x74, 0x22, 0x5d,
];

/// Write a package named `name` holding `wasm` into `dir`.
pub fn write_package(dir: &std::path::Path, name: &str, wasm: &[u8]) {
    let manifest = format!(
        "[plugin]\nname = \"{name}\"\nversion = \"1.0.0\"\n\n[build]\nwasm = \"plugin.wasm\"\n"
    );
    std::fs::write(dir.join(crate::manifest::MANIFEST_FILE), manifest)
        .expect("failed to write manifest");
    std::fs::write(dir.join("plugin.wasm"), wasm).expect("failed to write wasm");
}
