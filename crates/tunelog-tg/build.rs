fn main() {
    vergen::EmitBuilder::builder()
        .build_timestamp()
        .git_branch()
        .git_commit_timestamp()
        .git_sha(false)
        .rustc_channel()
        .rustc_semver()
        .cargo_target_triple()
        .cargo_opt_level()
        .emit()
        .unwrap();
}
