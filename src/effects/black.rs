use super::parse_layer;
use crate::run::Outcome;
use ft_common::{Geometry, Paint, Transport};

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "black")]
/// clear the display (or fill it with one color) and exit
pub struct Args {
    #[argh(option, short = 'g', default = "Geometry::default()")]
    /// output geometry <W>x<H>[+<X>+<Y>] (default 45x35+0+0)
    geometry: Geometry,

    #[argh(option, short = 'l', default = "0", from_str_fn(parse_layer))]
    /// layer 0-15 (default 0)
    layer: i32,

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'c')]
    /// fill color as RRGGBB (default transparent)
    color: Option<Paint>,

    #[argh(positional)]
    /// display hostname, same as -h
    display: Option<String>,
}

impl Args {
    /// `-h` wins over the positional hostname.
    fn host(&self) -> Option<&str> {
        self.host.as_deref().or(self.display.as_deref())
    }
}

pub async fn run(args: Args) -> anyhow::Result<Outcome> {
    let mut canvas = args.geometry.canvas()?;
    if let Some(paint) = args.color {
        canvas.fill(paint.to_wire());
    }
    let layer = args.geometry.layer.unwrap_or(args.layer);
    canvas.set_offset(args.geometry.x, args.geometry.y, layer);

    let mut transport = Transport::open(args.host()).await?;
    info!(display = %transport.peer_addr(), geometry = %args.geometry, "clearing");
    transport.send(&canvas).await?;

    Ok(Outcome::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    fn parse(args: &[&str]) -> Args {
        Args::from_args(&["black"], args).unwrap_or_else(|exit| panic!("{}", exit.output))
    }

    #[test]
    fn host_as_positional() {
        assert_eq!(parse(&["localhost"]).host(), Some("localhost"));
        assert_eq!(parse(&["-g", "10x10", "ft.local:1337"]).host(), Some("ft.local:1337"));
    }

    #[test]
    fn host_flag_wins() {
        assert_eq!(parse(&["-h", "a", "b"]).host(), Some("a"));
        assert_eq!(parse(&["-h", "a"]).host(), Some("a"));
        assert_eq!(parse(&[]).host(), None);
    }
}
