fn main() {
    liveness_check_lib::run()
}
