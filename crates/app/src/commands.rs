use std::io::{BufRead, Write};

use anyhow::{Context, bail};
use comfy_table::{Cell, Table};
use quiz_core::model::{Mode, PresentedQuestion};
use quiz_core::scoring::PASSING_TOTAL;
use services::{ProgressOverview, QuizServices, SessionError, SessionReport};

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

pub async fn status(services: &QuizServices, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let progress = services.progress().load().await?;
    let today = services.progress().clock().today();
    let overview = ProgressOverview::build(&progress, services.bank(), today);

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&overview)?)?;
        return Ok(());
    }

    let b = &overview.breakdown;
    writeln!(out, "Score: {} / 1000", overview.total_score)?;
    writeln!(
        out,
        "  accuracy {:.0}  difficulty {:.0}  improvement {:.0}  streak {:.0}  coverage {:.0}",
        b.basic_accuracy, b.difficulty_bonus, b.weakness_bonus, b.streak_bonus, b.stage_coverage
    )?;
    if overview.is_passing {
        writeln!(out, "Status: passing")?;
    } else if overview.points_to_pass > 0 {
        writeln!(
            out,
            "Status: {} more points to reach {PASSING_TOTAL}",
            overview.points_to_pass
        )?;
    } else {
        writeln!(out, "Status: every stage needs at least 70% accuracy")?;
    }
    writeln!(
        out,
        "Streak: {} day(s)  Sessions: {}  Questions attempted: {}/{}",
        overview.streak,
        overview.session_count,
        overview.attempted_questions,
        services.bank().len()
    )?;
    writeln!(out, "Due for review: {}", overview.review_count)?;
    writeln!(out, "Recommended stage: {}", overview.recommended_stage.display_name())?;

    if !overview.weak_tags.is_empty() {
        let tags: Vec<String> = overview
            .weak_tags
            .iter()
            .map(|w| format!("{} ({})", w.tag, percent(w.accuracy.rate)))
            .collect();
        writeln!(out, "Weak topics: {}", tags.join(", "))?;
    }

    if !overview.recent_sessions.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Date", "Stage", "Correct", "Score"]);
        for s in overview.recent_sessions.iter().rev() {
            table.add_row(vec![
                Cell::new(s.date.format("%Y-%m-%d %H:%M")),
                Cell::new(s.stage_id.display_name()),
                Cell::new(format!("{}/{}", s.correct, s.total)),
                Cell::new(s.score),
            ]);
        }
        writeln!(out, "\n{table}")?;
    }
    Ok(())
}

pub async fn stages(services: &QuizServices, out: &mut impl Write) -> anyhow::Result<()> {
    let progress = services.progress().load().await?;
    let today = services.progress().clock().today();
    let overview = ProgressOverview::build(&progress, services.bank(), today);

    let mut table = Table::new();
    table.set_header(vec![
        "Id",
        "Stage",
        "Questions",
        "Progress",
        "Accuracy",
        "Best",
        "Sessions",
    ]);
    for stage in &overview.stages {
        table.add_row(vec![
            Cell::new(stage.stage_id),
            Cell::new(stage.name),
            Cell::new(stage.question_count),
            Cell::new(percent(stage.progress)),
            Cell::new(percent(stage.accuracy)),
            Cell::new(stage.best_score.map_or_else(|| "-".to_string(), |s| s.to_string())),
            Cell::new(stage.session_count),
        ]);
    }
    writeln!(out, "{table}")?;
    Ok(())
}

fn print_question(
    out: &mut impl Write,
    position: usize,
    total: usize,
    question: &PresentedQuestion,
) -> std::io::Result<()> {
    writeln!(out, "\n[{}/{}] {}", position + 1, total, question.body)?;
    for (i, choice) in question.choices.iter().enumerate() {
        writeln!(out, "  {}) {}", i + 1, choice.text)?;
    }
    write!(out, "> ")?;
    out.flush()
}

/// Read a 1-based choice number until one is in range. `None` on end of input.
fn read_choice(
    input: &mut impl BufRead,
    out: &mut impl Write,
    choices: usize,
) -> anyhow::Result<Option<usize>> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=choices).contains(&n) => return Ok(Some(n - 1)),
            _ => {
                write!(out, "Enter a number from 1 to {choices}: ")?;
                out.flush()?;
            }
        }
    }
}

fn print_report(out: &mut impl Write, report: &SessionReport) -> std::io::Result<()> {
    writeln!(
        out,
        "\n{}/{} correct ({}%), score {}, time {}",
        report.correct, report.total, report.accuracy_percent, report.score, report.elapsed
    )?;
    if !report.missed.is_empty() {
        writeln!(out, "\nReview these:")?;
        for missed in &report.missed {
            writeln!(out, "- {}", missed.body)?;
            if let Some(picked) = &missed.selected_choice_text {
                writeln!(out, "    you answered: {picked}")?;
            }
            writeln!(out, "    correct: {}", missed.correct_choice_text)?;
            if !missed.explanation.is_empty() {
                writeln!(out, "    {}", missed.explanation)?;
            }
        }
    }
    Ok(())
}

pub async fn quiz(
    services: &QuizServices,
    mode: Mode,
    count: usize,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let loop_svc = services.session_loop();
    let mut session = match loop_svc.start_session(mode, count).await {
        Ok(session) => session,
        Err(SessionError::Empty) if mode.is_review() => {
            writeln!(out, "Nothing to review yet. Try a stage quiz first.")?;
            return Ok(());
        }
        Err(SessionError::Empty) => {
            writeln!(out, "No questions available for {mode}.")?;
            return Ok(());
        }
        Err(err) => return Err(err).context("starting session"),
    };

    let total = session.questions().len();
    while let Some(question) = session.current_question() {
        let choices = question.choices.len();
        print_question(out, session.position(), total, question)?;

        let Some(index) = read_choice(input, out, choices)? else {
            bail!("input ended before the session finished; nothing was saved");
        };
        let answered = loop_svc.answer_current(&mut session, index)?;
        let feedback = &answered.feedback;
        if feedback.is_correct() {
            writeln!(out, "Correct.")?;
        } else {
            writeln!(
                out,
                "Wrong. The answer is {}) {}",
                feedback.correct_index() + 1,
                feedback.correct_choice_text
            )?;
        }
        if !feedback.explanation.is_empty() {
            writeln!(out, "{}", feedback.explanation)?;
        }
    }

    let outcome = loop_svc.finish(&mut session).await?;
    print_report(out, &outcome.report)?;
    Ok(())
}
