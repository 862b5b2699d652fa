fn main() {
    parlance::start();
}
