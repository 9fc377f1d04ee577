//! Bash completion script generation for `--completion`.

use crate::expr::Env;

const FLAGS: &[&str] = &[
    "-n", "--newline",
    "-w", "--white-space",
    "-l", "--linewise",
    "-j", "--json",
    "-y", "--yaml",
    "-x", "--xml",
    "-f", "--file",
    "-p", "--plain",
    "-e", "--exec",
    "-i", "--in-place",
    "--backup",
    "--color",
    "--list",
    "--completion",
    "-v", "--verbose",
];

/// Render a bash completion script covering the CLI flags and every
/// registered function name. Meant to be sourced:
/// `slrp --completion > ~/.local/share/bash-completion/completions/slrp`
pub fn completion_script(env: &Env) -> String {
    let mut words: Vec<&str> = FLAGS.to_vec();
    words.extend(env.function_names());

    format!(
        r#"#!/usr/bin/env bash

_slrp_files() {{
  local cur=${{COMP_WORDS[COMP_CWORD]}}

  local IFS=$'\n'
  COMPREPLY=( $( compgen -o plusdirs -f -- "$cur" ) )
}}

complete -W "{words}" -o filenames -F _slrp_files slrp
"#,
        words = words.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lists_flags() {
        let script = completion_script(&Env::new());
        assert!(script.contains("--linewise"));
        assert!(script.contains("complete -W"));
        assert!(script.ends_with("slrp\n"));
    }

    #[test]
    fn script_lists_registered_functions() {
        let mut env = Env::new();
        env.register("size", "x => x.length").unwrap();
        let script = completion_script(&env);
        assert!(script.contains(" size"));
    }
}
