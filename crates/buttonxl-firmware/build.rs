fn main() {
    println!("cargo:rerun-if-changed=sdkconfig.defaults");
    println!("cargo:rerun-if-changed=tinyusb_bindings.h");
    embuild::espidf::sysenv::output();
}
