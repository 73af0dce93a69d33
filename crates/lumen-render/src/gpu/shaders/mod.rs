//! WGSL shader sources for path tracing.

/// The path-tracing compute kernel. One invocation shades one pixel.
pub const PATHTRACE_SHADER: &str = include_str!("pathtrace.wgsl");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::GROUP_SIZE;

    #[test]
    fn test_workgroup_matches_grid() {
        let decl = format!("@workgroup_size({GROUP_SIZE}, {GROUP_SIZE})");
        assert!(PATHTRACE_SHADER.contains(&decl));
    }

    #[test]
    fn test_bounce_stack_matches_max_bounces() {
        let decl = format!("const MAX_BOUNCES: u32 = {}u;", lumen_scene::MAX_BOUNCES);
        assert!(PATHTRACE_SHADER.contains(&decl));
    }

    #[test]
    fn test_degenerate_spheres_skipped() {
        assert!(PATHTRACE_SHADER.contains("if (sphere.radius <= EPSILON) {"));
    }
}
