use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::{Captures, Regex};

use crate::catalog::{Catalog, NavLink};
use crate::cli::PageArgs;
use crate::content::{Example, FillBlank, GeneratedContent, KeyPoint, MultipleChoice};
use crate::workspace::{Workspace, write_atomic};

/// Every token a page template may contain.
pub const PLACEHOLDERS: [&str; 17] = [
    "GRAMMAR_POINT",
    "CATEGORY",
    "CATEGORY_ID",
    "INDEX",
    "NAME_EN",
    "OVERVIEW_FUNCTION",
    "USAGE_SCENARIOS",
    "RULES_DESCRIPTION",
    "KEY_POINTS",
    "EXAMPLES",
    "MULTIPLE_CHOICE",
    "FILL_BLANK",
    "ANSWERS",
    "SUMMARY",
    "RELATED_POINTS",
    "PREV_LINK",
    "NEXT_LINK",
];

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z_]+)\}\}").expect("valid token regex"));

pub fn render_usage_scenarios(scenarios: &[String]) -> String {
    scenarios
        .iter()
        .map(|s| format!("                    <li>{s}</li>"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_key_points(points: &[KeyPoint]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "<div class=\"key-point\"><h4>{n}. {point}</h4><p>{explanation}</p></div>",
                n = i + 1,
                point = p.point,
                explanation = p.explanation,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_examples(examples: &[Example]) -> String {
    examples
        .iter()
        .map(|ex| {
            format!(
                "<div class=\"example-item\"><p class=\"sentence\">{}</p><p class=\"translation\">{}</p><p class=\"analysis\">{}</p></div>",
                ex.sentence, ex.translation, ex.analysis
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_multiple_choice(questions: &[MultipleChoice]) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let n = i + 1;
            let options = q
                .options
                .iter()
                .map(|opt| {
                    let letter = opt.chars().next().map(String::from).unwrap_or_default();
                    format!("<label><input type=\"radio\" name=\"q{n}\" value=\"{letter}\"> {opt}</label>")
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "<div class=\"question\" data-answer=\"{answer}\" data-explanation=\"{explanation}\"><p class=\"q-text\">{n}. {question}</p><div class=\"options\">{options}</div></div>",
                answer = q.answer,
                explanation = q.explanation,
                question = q.question,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_fill_blank(questions: &[FillBlank]) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            format!(
                "<div class=\"question\" data-answer=\"{answer}\" data-explanation=\"{explanation}\"><p class=\"q-text\">{n}. {question}</p><input type=\"text\" class=\"fill-input\" placeholder=\"请输入答案\"></div>",
                n = i + 1,
                answer = q.answer,
                explanation = q.explanation,
                question = q.question,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_answers(multiple_choice: &[MultipleChoice], fill_blank: &[FillBlank]) -> String {
    let entry = |n: usize, answer: &str, explanation: &str| {
        format!("<p><strong>{n}.</strong> 答案：{answer} - {explanation}</p>")
    };

    let mut html = vec!["<h3>答案解析</h3>".to_owned(), "<h4>选择题</h4>".to_owned()];
    for (i, q) in multiple_choice.iter().enumerate() {
        html.push(entry(i + 1, &q.answer, &q.explanation));
    }
    html.push("<h4>填空与改写</h4>".to_owned());
    for (i, q) in fill_blank.iter().enumerate() {
        html.push(entry(i + 1, &q.answer, &q.explanation));
    }
    html.join("\n")
}

pub fn render_related_points(points: &[String]) -> String {
    points
        .iter()
        .map(|p| format!("<a href=\"#\" class=\"related-tag\">{p}</a>"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn prev_link(link: Option<&NavLink>) -> String {
    link.map(|l| {
        format!(
            "<a href=\"{}.html\" class=\"prev\">← 上一节：{}</a>",
            l.id, l.name
        )
    })
    .unwrap_or_default()
}

fn next_link(link: Option<&NavLink>) -> String {
    link.map(|l| {
        format!(
            "<a href=\"{}.html\" class=\"next\">下一节：{} →</a>",
            l.id, l.name
        )
    })
    .unwrap_or_default()
}

/// Substitutes known `{{TOKEN}}`s in one pass. Values are inserted verbatim
/// and never rescanned; unknown tokens are left alone.
pub fn substitute(template: &str, value_for: impl Fn(&str) -> Option<String>) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            value_for(&caps[1]).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

pub fn render_page(content: &GeneratedContent, catalog: &Catalog, template: &str) -> String {
    let point_id = format!("{:02}", content.index);
    let catalog_point = catalog.find(&point_id);
    let position = catalog_point
        .as_ref()
        .map(|info| info.position)
        .unwrap_or(content.index as usize);
    if position != content.index as usize {
        tracing::warn!(
            index = content.index,
            position,
            "content index disagrees with catalog order; navigation follows the catalog"
        );
    }
    let nav = catalog.navigation(position);

    let name_en = content
        .name_en
        .clone()
        .or_else(|| catalog_point.as_ref().map(|info| info.point.name_en.clone()))
        .unwrap_or_default();

    let body = &content.content;
    substitute(template, |token| {
        let value = match token {
            "GRAMMAR_POINT" => content.grammar_point.clone(),
            "CATEGORY" => content.category.clone(),
            "CATEGORY_ID" => catalog.category_id_for_name(&content.category).to_owned(),
            "INDEX" => content.index.to_string(),
            "NAME_EN" => name_en.clone(),
            "OVERVIEW_FUNCTION" => body.overview.function.clone(),
            "USAGE_SCENARIOS" => render_usage_scenarios(&body.overview.usage_scenarios),
            "RULES_DESCRIPTION" => body.rules.description.clone(),
            "KEY_POINTS" => render_key_points(&body.rules.key_points),
            "EXAMPLES" => render_examples(&body.examples),
            "MULTIPLE_CHOICE" => render_multiple_choice(&body.exercises.multiple_choice),
            "FILL_BLANK" => render_fill_blank(&body.exercises.fill_blank),
            "ANSWERS" => render_answers(
                &body.exercises.multiple_choice,
                &body.exercises.fill_blank,
            ),
            "SUMMARY" => body.summary.clone(),
            "RELATED_POINTS" => render_related_points(&body.related_points),
            "PREV_LINK" => prev_link(nav.prev.as_ref()),
            "NEXT_LINK" => next_link(nav.next.as_ref()),
            _ => return None,
        };
        Some(value)
    })
}

pub fn load_template(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("read page template: {}", path.display()))
}

/// Renders one content file and writes `<docs>/<index:02>.html`.
pub fn build_page(
    ws: &Workspace,
    catalog: &Catalog,
    template: &str,
    content_path: &Path,
) -> anyhow::Result<PathBuf> {
    let content = GeneratedContent::load(content_path)?;
    let html = render_page(&content, catalog, template);
    let out_path = ws.page_path(content.index);
    write_atomic(&out_path, &html)?;
    tracing::info!(
        point = %content.grammar_point,
        index = content.index,
        path = %out_path.display(),
        "page written"
    );
    Ok(out_path)
}

pub fn run(args: PageArgs) -> anyhow::Result<()> {
    let ws = args.workspace.workspace();
    if !args.input.exists() {
        anyhow::bail!("content file not found: {}", args.input.display());
    }
    let catalog = Catalog::load(&ws.catalog)?;
    let template = load_template(&ws.template)?;
    let out_path = build_page(&ws, &catalog, &template, &args.input)
        .with_context(|| format!("build page: {}", args.input.display()))?;
    crate::assets::install(&ws, false).context("install page assets")?;
    println!("{}", out_path.display());
    Ok(())
}
