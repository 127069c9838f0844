/// Example hiring queries offered to users who do not want to type one.
pub const SAMPLE_QUERIES: &[&str] = &[
    "I am hiring for Java developers who can also collaborate effectively with my business teams.",
    "Java developer with good communication skills",
    "Senior analyst with strong cognitive abilities",
    "Entry-level Python programmer",
    "Looking to hire mid-level professionals proficient in Python, SQL and JavaScript.",
    "Need a sales team lead with strong leadership and negotiation skills.",
];
