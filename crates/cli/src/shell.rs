//! Interactive storefront session.

use std::io::{self, BufRead, Write};

use gateway::{CartItem, Session};
use policy::Identity;

use crate::error::{Error, Result};
use crate::{AppGateway, cancel_by_prefix, print_listings, print_orders, seed};

const HELP: &str = "\
Commands:
  catalog              list restaurants you can order from
  add <restaurant> [n] add n of the restaurant's special to the cart
  less <restaurant>    take one special off the cart
  remove <restaurant>  drop the restaurant's special from the cart
  cart                 show the cart
  clear                empty the cart
  pay                  place the order
  orders               list your orders
  cancel <order>       cancel an order (id or prefix)
  settings             payment settings (admins only)
  login <user>         switch account
  quit                 leave";

pub fn run(gateway: &AppGateway, identity: Identity) -> Result<()> {
    println!("tablegate v{}", env!("CARGO_PKG_VERSION"));
    let mut session = Session::login(identity);
    greet(&session);
    println!("Type 'help' for commands, 'quit' or Ctrl+D to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();

        if command == "quit" || command == "exit" {
            break;
        }

        if command == "login" {
            match args.first().map(|id| seed::find_user(id)) {
                Some(Ok(user)) => {
                    session.logout();
                    session = Session::login(user.identity());
                    greet(&session);
                }
                Some(Err(e)) => eprintln!("Error: {e}\n"),
                None => eprintln!("Error: usage: login <user>\n"),
            }
            continue;
        }

        if let Err(e) = dispatch(gateway, &mut session, command, &args) {
            eprintln!("Error: {e}\n");
        }
    }

    session.logout();
    println!("\nSession ended.");
    Ok(())
}

fn greet(session: &Session) {
    let identity = session.identity();
    println!(
        "Logged in as {} ({}, {})",
        identity.id(),
        identity.role(),
        identity.region()
    );
}

fn dispatch(gateway: &AppGateway, session: &mut Session, command: &str, args: &[&str]) -> Result<()> {
    match command {
        "help" => println!("{HELP}"),
        "catalog" => print_listings(session.identity(), &gateway.request_catalog(session.identity())),
        "add" => {
            let restaurant_id = arg(args, 0, "add <restaurant> [n]")?;
            let quantity = match args.get(1) {
                Some(n) => n
                    .parse()
                    .map_err(|_| Error::Input(format!("bad quantity '{n}'")))?,
                None => 1,
            };
            let listing = gateway
                .request_catalog(session.identity())
                .into_iter()
                .find(|l| l.id == restaurant_id)
                .ok_or_else(|| Error::Input(format!("no restaurant '{restaurant_id}' in your region")))?;
            session.cart_mut().add(CartItem {
                id: special_id(restaurant_id),
                name: format!("{} Special", listing.name),
                restaurant_id: listing.id.clone(),
                unit_price: seed::SPECIAL_PRICE,
                quantity,
            })?;
            println!("Added from {}", listing.name);
        }
        "less" => {
            let restaurant_id = arg(args, 0, "less <restaurant>")?;
            if !session.cart_mut().decrease(&special_id(restaurant_id)) {
                println!("Not in cart.");
            }
        }
        "remove" => {
            let restaurant_id = arg(args, 0, "remove <restaurant>")?;
            if !session.cart_mut().remove(&special_id(restaurant_id)) {
                println!("Not in cart.");
            }
        }
        "cart" => show_cart(gateway, session)?,
        "clear" => session.cart_mut().clear(),
        "pay" => {
            let order = session.checkout(gateway)?;
            println!("Order placed: {} (${:.2})", order.id, order.total);
        }
        "orders" => print_orders(&gateway.request_orders(session.identity())?),
        "cancel" => {
            let prefix = arg(args, 0, "cancel <order>")?;
            let order = cancel_by_prefix(gateway, session.identity(), prefix)?;
            println!("Order cancelled: {}", order.id);
        }
        "settings" => {
            for m in gateway.request_payment_methods(session.identity())? {
                let status = if m.active { "active" } else { "not connected" };
                println!("{:<16}  {:<20}  {status}", m.name, m.kind);
            }
        }
        other => return Err(Error::Input(format!("unknown command '{other}', try 'help'"))),
    }
    Ok(())
}

fn arg<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| Error::Input(format!("usage: {usage}")))
}

fn special_id(restaurant_id: &str) -> String {
    format!("{restaurant_id}-special")
}

fn show_cart(gateway: &AppGateway, session: &Session) -> Result<()> {
    let cart = session.cart();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }
    for item in cart.items() {
        println!("{:>3}x  {:<32}  ${:.2}", item.quantity, item.name, item.unit_price);
    }
    let quote = gateway.quote(&cart.lines())?;
    println!("Subtotal      ${:.2}", quote.subtotal);
    println!("Delivery fee  ${:.2}", quote.delivery_fee);
    if !quote.tax.is_zero() {
        println!("Tax           ${:.2}", quote.tax);
    }
    println!("Total         ${:.2}", quote.total);
    if !policy::can_place_order(session.identity()) {
        println!(
            "Payment disabled: as a {} you cannot pay. Ask a manager or admin.",
            session.identity().role()
        );
    }
    Ok(())
}
