fn main() {
    println!("cargo:rerun-if-changed=assets/control.html");
    println!("cargo:rerun-if-env-changed=FANCTL_CONFIG_JSON");
    println!("cargo:rerun-if-env-changed=FANCTL_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=FANCTL_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=FANCTL_SIGNALK_HOST");

    // Only the ESP-IDF build needs the sysenv link args; host builds
    // (unit tests, fuzzing) compile without embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
