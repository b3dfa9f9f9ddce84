use crate::utils::abs_diff;

// tag::pt1[]
fn pt1(nums: &[usize]) -> usize {
	let mut nums = nums.to_vec();
	nums.sort_unstable();
	// tag::debugging[]
	eprintln!("{:?}", nums);
	// end::debugging[]
	let median = nums[nums.len() / 2];
	nums.iter().map(|&n| abs_diff(n, median)).sum()
}
// end::pt1[]

// tag::pt2[]
	fn pt2(nums: &[usize]) -> usize {
		let mean = nums.iter().sum::<usize>() / nums.len();
		nums.iter().map(|&n| abs_diff(n, mean)).sum()
	}
// end::pt2[]

// tag::debugging[]
fn dump(nums: &[usize]) {
	println!("{:?}", nums);
}
// end::debugging[]
