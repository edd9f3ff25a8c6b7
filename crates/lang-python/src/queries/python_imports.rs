codegraph_plugin::decl_indices!(ImportIndices, {
    module => "import.module",
    module_alias => "import.alias",
    from_module => "from.module",
    from_name => "from.name",
    from_alias => "from.alias",
    wildcard => "from.wildcard",
    statement => "import.statement",
});

pub const PYTHON_IMPORTS_SCM: &str = include_str!("python_imports.scm");
