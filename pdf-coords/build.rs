fn main() {
    // No build-time setup needed for dynamic linking.
    // PDFium is loaded at runtime from:
    // 1. The configured `pdfium.library_dir`
    // 2. Current directory
    // 3. vendor/pdfium/lib/
    // 4. System library paths
    println!("cargo:rerun-if-changed=build.rs");
}
