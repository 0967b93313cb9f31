use std::{
    fmt::Write as _,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::{
    db::Question,
    questions::{parse_question_pack, random_question, save_generated},
};

use super::AppContext;

const PREVIEW_LIMIT: usize = 20;

#[derive(Subcommand, Debug, PartialEq)]
pub enum QuestionsCommand {
    #[command(about = "Show the newest questions in the bank")]
    List {
        #[arg(long, help = "Only this topic")]
        topic: Option<String>,
        #[arg(long, default_value_t = PREVIEW_LIMIT, help = "How many to show")]
        limit: usize,
    },
    #[command(about = "Random-question recall drill")]
    Quiz {
        #[arg(long, help = "Only this topic; blank quizzes everything")]
        topic: Option<String>,
    },
    #[command(about = "Add a generated question pack (JSON) to the bank")]
    Import {
        file: PathBuf,
        #[arg(long, default_value = "General")]
        topic: String,
    },
    #[command(about = "Delete every question")]
    Clear {
        #[arg(long, help = "Required to confirm")]
        yes: bool,
    },
}

pub async fn process_questions_command(ctx: &AppContext, command: QuestionsCommand) -> Result<()> {
    match command {
        QuestionsCommand::List { topic, limit } => {
            let questions = ctx.db.questions(topic.as_deref()).await?;
            print!("{}", render_question_list(&questions, limit));
        }
        QuestionsCommand::Quiz { topic } => run_quiz(ctx, topic.as_deref()).await?,
        QuestionsCommand::Import { file, topic } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let pack = parse_question_pack(&json)?;
            let saved = save_generated(&ctx.db, &topic, &pack).await?;
            println!("Saved {} questions under {}.", saved.len(), topic.trim());
        }
        QuestionsCommand::Clear { yes } => {
            if !yes {
                println!("This deletes every question. Re-run with --yes to confirm.");
                return Ok(());
            }
            let removed = ctx.db.delete_all_questions().await?;
            println!("Deleted {removed} questions.");
        }
    }
    Ok(())
}

pub(crate) fn render_question_list(questions: &[Question], limit: usize) -> String {
    if questions.is_empty() {
        return "No questions yet. Import a pack with `questions import`.\n".to_string();
    }
    let mut out = String::new();
    for q in questions.iter().take(limit) {
        let first_line = q.question.lines().next().unwrap_or_default();
        let _ = writeln!(
            out,
            "#{:<4} [{}] {} | {}  (+{} / -{})",
            q.id,
            q.q_type.as_str(),
            q.topic,
            first_line,
            q.correct_count,
            q.wrong_count
        );
    }
    if questions.len() > limit {
        let _ = writeln!(out, "... and {} more", questions.len() - limit);
    }
    out
}

#[derive(Debug, PartialEq)]
enum QuizReply {
    Correct,
    Wrong,
    Skip,
    Quit,
}

fn parse_reply(input: &str) -> QuizReply {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => QuizReply::Correct,
        "n" | "no" => QuizReply::Wrong,
        "q" | "quit" => QuizReply::Quit,
        _ => QuizReply::Skip,
    }
}

fn prompt(stdin: &mut impl BufRead, message: &str) -> Result<Option<String>> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

async fn run_quiz(ctx: &AppContext, topic: Option<&str>) -> Result<()> {
    let mut rng = rand::thread_rng();
    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let (mut right, mut wrong) = (0u32, 0u32);

    loop {
        let Some(question) = random_question(&ctx.db, topic, &mut rng).await? else {
            println!("No questions available for this topic yet.");
            break;
        };

        println!("\n[{}] {}\n{}\n", question.q_type.as_str(), question.topic, question.question);
        if prompt(&mut stdin, "Press Enter to reveal the answer (q to stop) ")?
            .map_or(true, |line| parse_reply(&line) == QuizReply::Quit)
        {
            break;
        }
        println!("{}\n", question.answer);

        let Some(reply) = prompt(&mut stdin, "Did you get it right? [y/n, Enter to skip, q to stop] ")? else {
            break;
        };
        match parse_reply(&reply) {
            QuizReply::Correct => {
                ctx.db.mark_answer(question.id, true).await?;
                right += 1;
            }
            QuizReply::Wrong => {
                ctx.db.mark_answer(question.id, false).await?;
                wrong += 1;
            }
            QuizReply::Skip => {}
            QuizReply::Quit => break,
        }
    }

    if right + wrong > 0 {
        println!("Score this round: {right} right, {wrong} wrong.");
    }
    Ok(())
}
