use clap::{Arg, Command};

pub const CMD_POST: &str = "post";
pub const CMD_DRAFT: &str = "draft";
pub const CMD_COMMENT: &str = "comment";

pub const ARG_TITLE: &str = "title";
pub const ARG_CONTENT: &str = "content";
pub const ARG_IMAGE: &str = "image";
pub const ARG_POST_ID: &str = "post-id";

fn title_arg() -> Arg {
    Arg::new(ARG_TITLE)
        .short('t')
        .long("title")
        .help("Post title, up to 100 characters")
        .required(true)
}

fn content_arg() -> Arg {
    Arg::new(ARG_CONTENT)
        .short('m')
        .long("content")
        .help("Text to publish")
        .required(true)
}

#[must_use]
pub fn subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_POST)
                .about("Publish a new post")
                .arg(title_arg())
                .arg(content_arg())
                .arg(
                    Arg::new(ARG_IMAGE)
                        .long("image")
                        .help("JPG or PNG image to attach, at most 5MB"),
                ),
        )
        .subcommand(
            Command::new(CMD_DRAFT)
                .about("Ask the forum to draft content for a title")
                .arg(title_arg()),
        )
        .subcommand(
            Command::new(CMD_COMMENT)
                .about("Comment on a post")
                .arg(
                    Arg::new(ARG_POST_ID)
                        .long("post-id")
                        .help("Id of the post to comment on")
                        .required(true)
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(content_arg()),
        )
}
