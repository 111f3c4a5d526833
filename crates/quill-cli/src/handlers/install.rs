use anyhow::Result;
use owo_colors::OwoColorize;

pub struct InstallHandler;

impl InstallHandler {
    pub fn install_pkgs(packages: &[String], debug: bool) -> Result<()> {
        if packages.is_empty() {
            quill_logger::error("No packages specified. Usage: quill install <package>[@version]...");
            return Ok(());
        }

        Self::print_header(packages);
        quill_core::install_packages(".", packages, debug)
    }

    fn print_header(packages: &[String]) {
        let package_list = packages.join(" ");
        println!(
            "{} {} {}",
            "quill".bright_cyan().bold(),
            "install".bright_white(),
            package_list.bright_white()
        );
        println!();
    }
}
