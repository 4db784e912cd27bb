mod openai_stub;

use std::fs;
use std::path::Path;

use openai_stub::{API_KEY, OpenAiStub, ReplyBehavior};
use predicates::prelude::*;

const TEMPLATE: &str = include_str!("../templates/grammar_page.html");

fn write_site(root: &Path) -> anyhow::Result<()> {
    let catalog = serde_json::json!({
        "categories": [
            {
                "id": "phrases",
                "name": "短语",
                "points": [{ "id": "01", "name": "名词短语", "name_en": "Noun Phrases" }]
            },
            {
                "id": "clauses",
                "name": "从句",
                "points": [{ "id": "02", "name": "定语从句", "name_en": "Relative Clauses" }]
            }
        ]
    });
    fs::create_dir_all(root.join("config"))?;
    fs::write(
        root.join("config").join("grammar_points.json"),
        serde_json::to_string_pretty(&catalog)?,
    )?;
    fs::create_dir_all(root.join("templates"))?;
    fs::write(root.join("templates").join("grammar_page.html"), TEMPLATE)?;
    Ok(())
}

fn grammarsite(root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("grammarsite");
    cmd.env_remove("DEEPSEEK_API_KEY").env_remove("RUST_LOG");
    cmd.current_dir(root);
    cmd
}

#[test]
fn prompt_generate_build_produces_pages() -> anyhow::Result<()> {
    let stub = OpenAiStub::spawn(ReplyBehavior::FencedContent);
    let temp = tempfile::TempDir::new()?;
    let root = temp.path();
    write_site(root)?;

    grammarsite(root).args(["prompt", "--all"]).assert().success();
    let prompt = fs::read_to_string(root.join("prompts/generated/prompt_02.txt"))?;
    assert!(prompt.contains("- 知识点名称：定语从句"));
    assert!(prompt.contains("- 序号：2/2"));

    grammarsite(root)
        .env("DEEPSEEK_API_KEY", API_KEY)
        .args(["generate", "--base-url", &stub.base_url, "--delay-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "generation finished: succeeded 2 (skipped 0), failed 0",
        ));
    assert_eq!(stub.request_count(), 2);

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join("content/01.json"))?)?;
    assert_eq!(content["grammar_point"], "名词短语");
    assert_eq!(content["index"], 1);

    grammarsite(root)
        .args(["build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("build finished: succeeded 2 (skipped 0), failed 0"));

    let html = fs::read_to_string(root.join("docs/01.html"))?;
    assert!(html.contains("<h1><span class=\"index\">1</span> 名词短语</h1>"));
    assert!(html.contains("Noun Phrases"));
    assert!(!html.contains("{{"));

    let alpha = html.find("Alpha sentence.").expect("first example");
    let bravo = html.find("Bravo sentence.").expect("second example");
    let charlie = html.find("Charlie sentence.").expect("third example");
    assert!(alpha < bravo && bravo < charlie);

    // Three multiple-choice plus two fill-blank questions.
    assert_eq!(html.matches("<p><strong>").count(), 5);
    assert!(html.contains("<a href=\"02.html\" class=\"next\">下一节：定语从句 →</a>"));
    assert!(!html.contains("class=\"prev\""));

    let last = fs::read_to_string(root.join("docs/02.html"))?;
    assert!(last.contains("<a href=\"01.html\" class=\"prev\">← 上一节：名词短语</a>"));
    assert!(!last.contains("class=\"next\""));
    assert!(last.contains("data-category=\"clauses\""));

    // The page's answer toggle and self-check script ship alongside it.
    assert!(html.contains("onclick=\"toggleAnswers()\""));
    let script = fs::read_to_string(root.join("docs/assets/js/main.js"))?;
    assert!(script.contains("function toggleAnswers("));
    assert!(root.join("docs/assets/css/style.css").is_file());

    // A second build finds every page current.
    grammarsite(root)
        .args(["build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("succeeded 2 (skipped 2), failed 0"));

    // A second generation sweep never touches the endpoint.
    grammarsite(root)
        .env("DEEPSEEK_API_KEY", API_KEY)
        .args(["generate", "--base-url", &stub.base_url, "--delay-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("succeeded 2 (skipped 2), failed 0"));
    assert_eq!(stub.request_count(), 2);

    Ok(())
}

#[test]
fn page_command_renders_a_single_content_file() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let root = temp.path();
    write_site(root)?;

    let content = serde_json::json!({
        "grammar_point": "定语从句",
        "category": "从句",
        "index": 2,
        "content": {
            "overview": { "function": "修饰名词", "usage_scenarios": ["描述人"] },
            "rules": { "description": "关系词引导", "key_points": [] },
            "examples": [{ "sentence": "The man who called is here.", "translation": "打电话的人来了。", "analysis": "who" }],
            "exercises": { "multiple_choice": [], "fill_blank": [] },
            "summary": "关系词连接先行词",
            "related_points": ["名词性从句"]
        }
    });
    let input = root.join("fabricated.json");
    fs::write(&input, content.to_string())?;

    grammarsite(root)
        .args(["page", "--input", input.to_str().expect("utf-8 path")])
        .assert()
        .success()
        .stdout(predicate::str::contains("02.html"));

    let html = fs::read_to_string(root.join("docs/02.html"))?;
    assert!(html.contains("The man who called is here."));
    assert!(html.contains("<a href=\"#\" class=\"related-tag\">名词性从句</a>"));
    assert_eq!(html.matches("<p><strong>").count(), 0);
    assert!(root.join("docs/assets/js/main.js").is_file());
    Ok(())
}
