use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, info_span};

use lead_cli::pipeline::{
    ask_question, build_context, build_engine, load_saved_mapping, load_upload, map_upload,
    save_report, suggestion_provider, summarize_upload,
};
use lead_cli::types::{AnswerReport, MappingReport, SummaryReport, Upload};
use lead_ingest::InMemorySummaryStore;
use lead_map::MappingRepository;
use lead_model::{Category, Field};

use crate::cli::{
    AskArgs, FieldsArgs, MappingCommand, OutputFormatArg, SuggestArgs, SummaryArgs,
};
use crate::summary::{
    print_answer_report, print_fields, print_mapping_list, print_mapping_report,
    print_stored_mapping, print_summary_report,
};

pub fn run_suggest(args: &SuggestArgs) -> Result<MappingReport> {
    let category = Category::from(args.upload.category);
    let span = info_span!("suggest", category = %category);
    let _guard = span.enter();

    let upload = load_upload(&args.upload.file, category, &args.upload.read_options())?;
    let suggestion = args.ai.suggestion_options();
    let engine = build_engine(category, suggestion.as_ref());
    let mut report = map_upload(&upload, &engine);

    if args.save {
        let Some(workspace) = args.workspace.as_deref() else {
            bail!("--save needs --workspace");
        };
        let repository = MappingRepository::new(&args.repository.repository)?;
        save_report(&repository, workspace, &mut report)?;
    }

    match args.format {
        OutputFormatArg::Table => print_mapping_report(&report),
        OutputFormatArg::Json => print_json(&report)?,
    }
    Ok(report)
}

pub fn run_fields(args: &FieldsArgs) -> Result<()> {
    let categories: Vec<Category> = match args.category {
        Some(category) => vec![category.into()],
        None => Category::ALL.to_vec(),
    };
    match args.format {
        OutputFormatArg::Table => print_fields(&categories),
        OutputFormatArg::Json => {
            let listing: Vec<FieldListing> = categories
                .iter()
                .map(|category| FieldListing {
                    category: *category,
                    required: category.fields().required.to_vec(),
                    optional: category.fields().optional.to_vec(),
                })
                .collect();
            print_json(&listing)?;
        }
    }
    Ok(())
}

pub fn run_summary(args: &SummaryArgs) -> Result<SummaryReport> {
    let category = Category::from(args.upload.category);
    let upload = load_upload(&args.upload.file, category, &args.upload.read_options())?;
    let saved = load_saved_mapping(&args.repository.repository, &args.workspace, category)?;
    let store = InMemorySummaryStore::default();
    let report = summarize_upload(&upload, &args.workspace, &store, saved.as_ref());
    match args.format {
        OutputFormatArg::Table => print_summary_report(&report),
        OutputFormatArg::Json => print_json(&report)?,
    }
    Ok(report)
}

pub fn run_ask(args: &AskArgs) -> Result<AnswerReport> {
    let span = info_span!("ask", workspace = %args.workspace);
    let _guard = span.enter();

    let uploads = args
        .uploads()
        .into_iter()
        .map(|(path, category)| load_upload(&path, category, &args.read_options()))
        .collect::<Result<Vec<Upload>>>()?;
    let store = InMemorySummaryStore::default();
    let context = build_context(&uploads, &args.workspace, &store);

    let provider = args.ai.suggestion_options().and_then(|options| suggestion_provider(&options));
    let answer = match provider {
        Some(provider) => Some(ask_question(provider.as_ref(), &args.question, &context)?),
        None if args.show_context => None,
        None => bail!(
            "answering questions needs the hosted model; set GEMINI_API_KEY or pass --show-context"
        ),
    };

    let report = AnswerReport {
        workspace: args.workspace.clone(),
        question: args.question.clone(),
        context,
        answer,
    };
    match args.format {
        OutputFormatArg::Table => print_answer_report(&report, args.show_context),
        OutputFormatArg::Json => print_json(&report)?,
    }
    Ok(report)
}

pub fn run_mapping(command: &MappingCommand) -> Result<()> {
    match command {
        MappingCommand::List { repository, format } => {
            let repository = MappingRepository::new(&repository.repository)?;
            let entries = repository.list()?;
            match format {
                OutputFormatArg::Table => print_mapping_list(&entries),
                OutputFormatArg::Json => print_json(&entries)?,
            }
        }
        MappingCommand::Show {
            target,
            repository,
            format,
        } => {
            let category = Category::from(target.category);
            let repository = MappingRepository::new(&repository.repository)?;
            let Some(stored) = repository.load_stored(&target.workspace, category)? else {
                bail!(
                    "no {category} mapping saved for workspace {}",
                    target.workspace
                );
            };
            match format {
                OutputFormatArg::Table => print_stored_mapping(&stored),
                OutputFormatArg::Json => print_json(&stored)?,
            }
        }
        MappingCommand::Delete { target, repository } => {
            let category = Category::from(target.category);
            let repository = MappingRepository::new(&repository.repository)?;
            if repository.delete(&target.workspace, category)? {
                info!(workspace = %target.workspace, category = %category, "mapping deleted");
                println!("Deleted {category} mapping for {}", target.workspace);
            } else {
                bail!(
                    "no {category} mapping saved for workspace {}",
                    target.workspace
                );
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct FieldListing {
    category: Category,
    required: Vec<Field>,
    optional: Vec<Field>,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}
