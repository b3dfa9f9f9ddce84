// tag::setup[]
fn read_input(s: &str) -> Vec<u32> {
	s.lines().map(|l| l.parse().unwrap()).collect()
}
// end::setup[]
