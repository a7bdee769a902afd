fn main() {
    zap2xml_manager::app::cli::run();
}
