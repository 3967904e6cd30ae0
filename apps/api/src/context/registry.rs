// Fixed registry of context chunks. Descriptions live here because they are
// metadata; the full text comes from `<content_dir>/<id>.txt`.

/// Chunk used when classification selects nothing or cannot run.
pub const DEFAULT_CHUNK_ID: &str = "tell_me_about";

/// `(id, description)` pairs in prompt order.
pub const CHUNK_REGISTRY: &[(&str, &str)] = &[
    (
        "resume",
        "Justin Stutler's professional resume, including education, skills, work experience, and student organizations.",
    ),
    (
        "sop",
        "Justin Stutler's Statement of Purpose, detailing his academic and professional journey, motivations for pursuing AI, and future goals.",
    ),
    (
        "gre_scores",
        "Justin Stutler's GRE General Test scores, including Verbal Reasoning, Quantitative Reasoning, and Analytical Writing sections.",
    ),
    (
        "courses",
        "A comprehensive list of courses Justin Stutler has taken, including AP credits, courses from University of North Georgia, Kennesaw State University, and University of South Florida.",
    ),
    (
        "personal_background",
        "General personal background information about Justin Stutler, including age, high school, interests, and summary of academic achievements.",
    ),
    (
        DEFAULT_CHUNK_ID,
        "A concise summary about Justin Stutler, his skills, and aspirations. Good for a general overview.",
    ),
];
