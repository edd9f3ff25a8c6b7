codegraph_plugin::decl_indices!(IncludeIndices, {
    path => "include.path",
    directive => "include",
});

pub const C_INCLUDES_SCM: &str = include_str!("c_includes.scm");
