fn main() {
    // option_env!() values are cached by cargo unless we ask for a rebuild.
    println!("cargo:rerun-if-env-changed=EXPENSE_API_URL");
    println!("cargo:rerun-if-env-changed=EXPENSE_POSTHOG_API_KEY");
}
