//! Deterministic URIs for job activities and job output files.
//!
//! Pure functions: the server base URL is always passed in, never read from
//! configuration.

/// `<server>/secure/getJobObject.do?jobId=<id>`
pub fn build_activity_uri(job_id: u64, server_url: &str) -> String {
    format!(
        "{}/secure/getJobObject.do?jobId={job_id}",
        trim_server(server_url)
    )
}

/// `<server>/secure/jobFile.do?jobId=<id>&key=<key>`, with the key
/// percent-encoded.
pub fn build_output_uri(job_id: u64, key: &str, server_url: &str) -> String {
    format!(
        "{}/secure/jobFile.do?jobId={job_id}&key={}",
        trim_server(server_url),
        urlencoding::encode(key)
    )
}

fn trim_server(server_url: &str) -> &str {
    server_url.strip_suffix('/').unwrap_or(server_url)
}
