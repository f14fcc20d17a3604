// [apps/ingest-orchestrator/build.rs]
//! §6: `ALLOW_TEST_PARAMS` must be unset in production builds. Test
//! builds (`debug_assertions` active) are expected to set it to exercise
//! deterministic clocks and fixed random seeds; a release build that
//! still has it set aborts here rather than at runtime.

fn main() {
    println!("cargo:rerun-if-env-changed=ALLOW_TEST_PARAMS");
    println!("cargo:rerun-if-env-changed=PROFILE");

    let test_params_set = std::env::var("ALLOW_TEST_PARAMS").is_ok();
    let is_release_profile = std::env::var("PROFILE").as_deref() == Ok("release");

    if test_params_set && is_release_profile {
        panic!(
            "ALLOW_TEST_PARAMS is set in a release build. Unset it before building for \
             production; it exists only to exercise deterministic clocks and fixed random \
             seeds in test builds."
        );
    }
}
