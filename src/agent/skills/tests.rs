use super::*;

fn workspace_with_skills(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, content) in files {
        let path = dir.path().join("skills").join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    dir
}

#[test]
fn missing_skills_dir_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let loader = SkillsLoader::new(dir.path());
    assert!(loader.load_all().is_empty());
    assert!(loader.build_context().is_empty());
}

#[test]
fn loads_markdown_documents() {
    let dir = workspace_with_skills(&[(
        "monitor.md",
        "# Monitor\n\nWatches the system for problems.\n\nDetails here.",
    )]);
    let loader = SkillsLoader::new(dir.path());
    let skills = loader.load_all();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].name, "monitor");
    assert_eq!(skills[0].description, "Watches the system for problems.");
    assert!(skills[0].content.contains("Details here."));
}

#[test]
fn nested_skills_get_path_names() {
    let dir = workspace_with_skills(&[
        ("ops/deploy.md", "# Deploy\n\nShips code."),
        ("notes.md", "Plain notes without heading."),
    ]);
    let loader = SkillsLoader::new(dir.path());
    let names: Vec<String> = loader.load_all().into_iter().map(|s| s.name).collect();
    assert!(names.contains(&"ops/deploy".to_string()));
    assert!(names.contains(&"notes".to_string()));
}

#[test]
fn non_markdown_files_are_ignored() {
    let dir = workspace_with_skills(&[("skill.md", "# S\n\nok")]);
    std::fs::write(dir.path().join("skills").join("script.py"), "print()").unwrap();
    let loader = SkillsLoader::new(dir.path());
    assert_eq!(loader.load_all().len(), 1);
}

#[test]
fn context_includes_name_description_and_content() {
    let dir = workspace_with_skills(&[("greet.md", "# Greet\n\nSays hello.\n\nAlways wave.")]);
    let loader = SkillsLoader::new(dir.path());
    let ctx = loader.build_context();
    assert!(ctx.starts_with("Available Skills:"));
    assert!(ctx.contains("## greet"));
    assert!(ctx.contains("Says hello."));
    assert!(ctx.contains("Always wave."));
}

#[test]
fn description_empty_when_only_headings() {
    let dir = workspace_with_skills(&[("bare.md", "# Title\n## Subtitle\n")]);
    let loader = SkillsLoader::new(dir.path());
    assert_eq!(loader.load_all()[0].description, "");
}
