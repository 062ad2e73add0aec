use std::{env, path::PathBuf};

fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // Only Windows builds need help locating FFmpeg.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!("cargo:warning=meanframe: set FFMPEG_DIR to an FFmpeg install (e.g. from vcpkg) to build on Windows.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.join("include").join("libavcodec").is_dir() {
        println!(
            "cargo:warning=meanframe: found FFmpeg at {}; export FFMPEG_DIR to use it.",
            candidate.display()
        );
    } else {
        println!(
            "cargo:warning=meanframe: no FFmpeg headers under {}.",
            candidate.display()
        );
    }
}
