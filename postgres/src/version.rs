use std::num::NonZeroI32;

/// Extracts the numeric server version from the `server_version` startup parameter.
///
/// The result uses the layout of `server_version_num`: `16.2 (Debian 16.2-1)` becomes
/// `160002` and `9.6.3` becomes `90603`. Returns [`None`] when no version can be read.
pub fn extract_server_version(server_version_str: impl AsRef<str>) -> Option<NonZeroI32> {
    let version_part = server_version_str
        .as_ref()
        .split_whitespace()
        .next()
        .unwrap_or("0.0");

    // Development builds report versions such as `17devel` or `16beta1`.
    let version_part = version_part
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .next()
        .unwrap_or("0.0");

    let version_components: Vec<&str> = version_part.split('.').collect();

    let component = |index: usize| {
        version_components
            .get(index)
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(0)
    };

    let major = component(0);
    let version = if major >= 10 {
        major * 10000 + component(1)
    } else {
        major * 10000 + component(1) * 100 + component(2)
    };

    NonZeroI32::new(version)
}
