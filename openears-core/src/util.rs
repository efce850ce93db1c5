use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// Creates a record id with the given prefix, such as `u_h1Cx9dT2mq`
pub fn prefixed_id(prefix: &str) -> String {
    format!("{}_{}", prefix, random_string(10))
}
