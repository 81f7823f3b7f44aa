fn main() {
    env_logger::init();

    simplebuilder_build::generate_builders()
        .scan_path("src/")
        .run()
        .expect("Failed to generate builders");
}
