// Shared by the bench targets; each one compiles this module separately.
#[allow(dead_code)]
pub fn generate_document(sections: usize) -> String {
    let mut content = String::from("# Report\n\n");
    for section in 0..sections {
        content.push_str(&format!(
            "## Section {section}\n\n\
             As shown in <<fig:chart-{section}>> and <<tab:data-{section}>>, see @knuth84.\n\n\
             ![Chart](chart-{section}.png \"Chart *{section}*#chart-{section}\")\n\n\
             | Key | Value |\n|-----|------:|\n| a   | {section} |\n| b   | 2 |\n\n\
             .Data for section {section}#data-{section}\n\n\
             - item with <<fig:chart-0>>\n- another item\n\n"
        ));
    }
    content
}

#[allow(dead_code)]
pub const BIBLIOGRAPHY: &str = "@book{knuth84, title = {The \\TeX{}book}, author = {Knuth, Donald E.}}\n";
